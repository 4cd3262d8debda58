//! Transformation module.
//!
//! - Filter: rows with at least one positive violation
//! - Aggregate: one row per driver
//! - Derive: violation label and count
//! - Pipeline: the full upload-to-workbook run

pub mod aggregate;
pub mod derive;
pub mod filter;
pub mod pipeline;

pub use aggregate::{aggregate, Aggregation};
pub use derive::{derive_row, derive_rows};
pub use filter::filter_rows;
pub use pipeline::*;
