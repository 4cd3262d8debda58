//! High-level pipeline API: report upload to grid workbook.
//!
//! ```text
//! bytes ─▶ parse ─▶ resolve ─▶ filter ─▶ aggregate ─▶ derive ─▶ render ─▶ store
//! ```
//!
//! [`summarize`] is the pure core (table in, result rows out).
//! [`process_bytes`] adds parsing and rendering, [`process_upload`] adds storage.
//!
//! # Example
//!
//! ```rust,ignore
//! use driver_grid::{process_upload, ArtifactStore, ColumnCatalog, PipelineOptions, Selection};
//!
//! let catalog = ColumnCatalog::builtin();
//! let selection = Selection::defaults(&catalog);
//! let bytes = std::fs::read("daily.xlsx")?;
//! let outcome = process_upload(&bytes, "daily.xlsx", &catalog, &selection,
//!     &PipelineOptions::default(), &ArtifactStore::new())?;
//! println!("{} drivers -> {}", outcome.report.rows.len(), outcome.artifact.key());
//! ```

use serde::Serialize;

use super::aggregate::aggregate;
use super::derive::derive_rows;
use super::filter::filter_rows;
use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult, SchemaResult};
use crate::models::{RawTable, ResultRow};
use crate::parser::{parse_bytes, ParseOptions, TableFormat};
use crate::render::{output_file_name, render_workbook};
use crate::schema::{resolve, ColumnCatalog, Selection};
use crate::storage::{ArtifactId, ArtifactStore};

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub parse: ParseOptions,
}

/// Row counts at each stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub input_rows: usize,
    pub filtered_rows: usize,
    pub drivers: usize,
    pub skipped_unnamed: usize,
}

/// Result of summarising one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Header of the first output column ("Driver Name" or "Name").
    pub name_column: String,
    /// Columns that took part, in declared order.
    pub columns: Vec<String>,
    /// Selected columns the upload did not have.
    pub missing_columns: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub stats: ReportStats,
}

impl Report {
    /// Whether the caller should be warned about anything.
    pub fn has_warnings(&self) -> bool {
        !self.missing_columns.is_empty() || self.stats.skipped_unnamed > 0
    }
}

/// A rendered, not yet stored, workbook.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub report: Report,
    pub file_name: String,
    pub workbook: Vec<u8>,
}

/// A stored workbook.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub report: Report,
    pub artifact: ArtifactId,
}

/// Resolve, filter, aggregate and derive. No I/O, no logging.
pub fn summarize(
    table: &RawTable,
    catalog: &ColumnCatalog,
    selection: &Selection,
) -> SchemaResult<Report> {
    let schema = resolve(catalog, table, selection)?;

    let filtered = filter_rows(table, &schema.available_columns);
    let aggregation = aggregate(
        table,
        &filtered,
        &schema.name_column,
        &schema.available_columns,
    );
    let rows = derive_rows(&aggregation.rows, selection.individual_count());

    Ok(Report {
        stats: ReportStats {
            input_rows: table.len(),
            filtered_rows: filtered.len(),
            drivers: rows.len(),
            skipped_unnamed: aggregation.skipped_unnamed,
        },
        name_column: schema.name_column,
        columns: schema.available_columns,
        missing_columns: schema.missing_columns,
        rows,
    })
}

/// Parse `bytes`, summarise, and render the workbook.
pub fn process_bytes(
    bytes: &[u8],
    file_name: &str,
    catalog: &ColumnCatalog,
    selection: &Selection,
    options: &PipelineOptions,
) -> PipelineResult<RenderedReport> {
    let format = TableFormat::detect(file_name)
        .ok_or_else(|| PipelineError::UnsupportedFormat(file_name.to_string()))?;

    log_info(format!("📖 Reading {} ({} bytes)...", file_name, bytes.len()));
    let parsed = parse_bytes(bytes, format, &options.parse)?;
    if let (Some(encoding), Some(delimiter)) = (&parsed.encoding, parsed.delimiter) {
        log_success(format!(
            "Detected encoding {}, separator '{}'",
            encoding,
            format_delimiter(delimiter)
        ));
    }
    log_success(format!(
        "Read {} rows, {} columns",
        parsed.table.len(),
        parsed.table.headers().len()
    ));

    let report = summarize(&parsed.table, catalog, selection)?;
    log_report(&report);

    let workbook = render_workbook(&report.name_column, &report.rows)?;
    let out_name = output_file_name(file_name);
    log_success(format!("Rendered {} ({} bytes)", out_name, workbook.len()));

    Ok(RenderedReport {
        report,
        file_name: out_name,
        workbook,
    })
}

/// Full run: parse, summarise, render, and persist under a unique name.
pub fn process_upload(
    bytes: &[u8],
    file_name: &str,
    catalog: &ColumnCatalog,
    selection: &Selection,
    options: &PipelineOptions,
    store: &ArtifactStore,
) -> PipelineResult<ProcessOutcome> {
    let rendered = process_bytes(bytes, file_name, catalog, selection, options)?;
    let artifact = store.save(&rendered.file_name, &rendered.workbook)?;
    log_success(format!("💾 Stored as {}", artifact.key()));

    Ok(ProcessOutcome {
        report: rendered.report,
        artifact,
    })
}

fn log_report(report: &Report) {
    log_info(format!("🪪 Name column: {}", report.name_column));
    log_info(format!("📋 Using {} column(s): {}", report.columns.len(), report.columns.join(", ")));
    if !report.missing_columns.is_empty() {
        log_warning(format!(
            "{} selected column(s) not in report: {}",
            report.missing_columns.len(),
            report.missing_columns.join(", ")
        ));
    }
    log_success(format!(
        "{} of {} rows have violations",
        report.stats.filtered_rows, report.stats.input_rows
    ));
    if report.stats.skipped_unnamed > 0 {
        log_warning(format!(
            "{} row(s) skipped (no driver name)",
            report.stats.skipped_unnamed
        ));
    }
    log_success(format!("📦 {} drivers", report.stats.drivers));
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
