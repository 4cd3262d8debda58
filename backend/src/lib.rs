//! # Driver Grid - per-driver violation summaries from safety reports
//!
//! Driver Grid reads a driver-safety report export (spreadsheet or delimited
//! text), keeps the rows that record violations, totals them per driver, and
//! writes a formatted `Name / Violations / Violations Count` workbook.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐
//! │  Upload  │──▶│  Parser  │──▶│  Schema  │──▶│  Filter + │──▶│  Derive  │──▶│  Render  │
//! │ xlsx/csv │   │ RawTable │   │ Resolver │   │ Aggregate │   │  labels  │   │   xlsx   │
//! └──────────┘   └──────────┘   └──────────┘   └───────────┘   └──────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use driver_grid::{process_bytes, ColumnCatalog, PipelineOptions, Selection};
//!
//! let catalog = ColumnCatalog::builtin();
//! let selection = Selection::defaults(&catalog);
//! let bytes = std::fs::read("daily.xlsx")?;
//! let rendered = process_bytes(&bytes, "daily.xlsx", &catalog, &selection, &PipelineOptions::default())?;
//! std::fs::write(&rendered.file_name, &rendered.workbook)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`models`] - Cells, tables, result rows
//! - [`config`] - Environment configuration
//! - [`parser`] - Spreadsheet and delimited-text parsing
//! - [`schema`] - Column catalog, selection, resolution
//! - [`transform`] - Filter, aggregate, derive, pipeline
//! - [`render`] - Output workbook
//! - [`storage`] - Artifact store
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Schema resolution
pub mod schema;

// Transformation
pub mod transform;

// Output
pub mod render;
pub mod storage;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::AppConfig;

pub use error::{
    ParseError, PipelineError, RenderError, SchemaError, ServerError, StorageError,
};

pub use models::{AggregatedRow, Cell, RawTable, ResultRow, Row};

pub use parser::{parse_bytes, parse_file, ParseOptions, ParsedReport, TableFormat};

pub use schema::{resolve, CatalogColumn, ColumnCatalog, ColumnGroup, ResolvedSchema, Selection};

pub use transform::{
    aggregate, derive_rows, filter_rows, process_bytes, process_upload, summarize,
    PipelineOptions, ProcessOutcome, RenderedReport, Report, ReportStats,
};

pub use render::{output_file_name, render_workbook, GridLayout};

pub use storage::{ArtifactId, ArtifactStore};

pub use api::types::{error_response, ColumnsResponse, UploadResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
