//! HTTP API module.
//!
//! Upload form, upload/download endpoints, and the SSE log stream.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server, AppState};
pub use types::*;
