//! Error types for the driver grid pipeline.
//!
//! Each layer owns its error enum:
//!
//! - [`ParseError`] - reading an uploaded report into a table
//! - [`SchemaError`] - selected columns or identity column unusable
//! - [`RenderError`] - writing the output workbook
//! - [`StorageError`] - persisting or fetching an artifact
//! - [`PipelineError`] - one upload run, wraps the above
//! - [`ServerError`] - HTTP layer
//!
//! Conversions are `From` impls so `?` crosses layer boundaries.

use thiserror::Error;

// =============================================================================
// Parsing Errors
// =============================================================================

/// Errors while turning uploaded bytes into a table.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited text.
    #[error("Line {line}: {message}")]
    Delimited { line: usize, message: String },

    /// The spreadsheet container could not be opened or read.
    #[error("Not a readable spreadsheet: {0}")]
    Spreadsheet(String),

    /// The workbook has no sheet to read.
    #[error("Spreadsheet has no worksheets")]
    NoWorksheet,

    /// Nothing to read at all.
    #[error("File is empty")]
    EmptyFile,

    /// Delimiters must be a single ASCII character.
    #[error("Unsupported delimiter '{0}', expected an ASCII character")]
    InvalidDelimiter(char),

    /// Delimited export ended inside the metadata preamble.
    #[error("File has {found} lines but the header row is expected after {skip} metadata lines")]
    MissingHeaderRow { skip: usize, found: usize },
}

// =============================================================================
// Schema Errors
// =============================================================================

/// The table cannot be summarised with the requested columns.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    /// None of the selected violation columns exist in the table.
    #[error("All selected columns are missing from the report: {}", missing.join(", "))]
    NoViolationColumns { missing: Vec<String> },

    /// Neither name column alias exists in the table.
    #[error("No identity column found, expected one of: {}", aliases.join(", "))]
    NoIdentityColumn { aliases: Vec<String> },

    /// A requested column is not part of the catalog.
    #[error("Unknown violation column: {0}")]
    UnknownColumn(String),
}

// =============================================================================
// Render Errors
// =============================================================================

/// Errors while producing the output workbook.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The xlsx writer rejected an operation.
    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors from the artifact store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Artifact was never produced or has been removed.
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// Artifact id or file name is not one the store could have issued.
    #[error("Invalid artifact name: {0}")]
    InvalidName(String),

    /// IO error.
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors for one upload run.
///
/// Returned by [`crate::transform::pipeline::process_upload`]. Every variant
/// is terminal for the request.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// File extension is not a supported spreadsheet or delimited format.
    #[error("Unsupported file format: '{0}' (expected .xlsx, .xlsm, .xlsb, .xls, .ods, .csv, .tsv or .txt)")]
    UnsupportedFormat(String),

    /// Parse error.
    #[error("Invalid report file: {0}")]
    Parse(#[from] ParseError),

    /// Schema error.
    #[error("Invalid report layout: {0}")]
    Schema(#[from] SchemaError),

    /// Render error.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Artifact lookup error on the download path.
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ParseError -> PipelineError
        let parse_err = ParseError::EmptyFile;
        let pipeline_err: PipelineError = parse_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // SchemaError -> PipelineError -> ServerError
        let schema_err = SchemaError::NoIdentityColumn {
            aliases: vec!["Driver Name".into(), "Name".into()],
        };
        let server_err: ServerError = PipelineError::from(schema_err).into();
        assert!(server_err.to_string().contains("Driver Name, Name"));
    }

    #[test]
    fn test_missing_columns_listed() {
        let err = SchemaError::NoViolationColumns {
            missing: vec!["U Turn".into(), "Speeding Violations".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("U Turn"));
        assert!(msg.contains("Speeding Violations"));
    }

    #[test]
    fn test_missing_header_row_format() {
        let err = ParseError::MissingHeaderRow { skip: 10, found: 4 };
        let msg = err.to_string();
        assert!(msg.contains("4 lines"));
        assert!(msg.contains("10 metadata lines"));
    }
}
