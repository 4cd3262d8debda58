//! REST API payloads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::ResultRow;
use crate::schema::{ColumnCatalog, ColumnGroup};
use crate::transform::pipeline::{ProcessOutcome, ReportStats};

/// Response sent after an upload has been processed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready" or "warning"
    pub status: String,

    /// `<id>/<file_name>` of the stored workbook
    pub artifact: String,

    /// Relative URL that streams the workbook back
    pub download_url: String,

    pub name_column: String,
    pub columns: Vec<String>,
    pub missing_columns: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub stats: ReportStats,
}

impl From<ProcessOutcome> for UploadResponse {
    fn from(outcome: ProcessOutcome) -> Self {
        let report = outcome.report;
        let status = if report.has_warnings() { "warning" } else { "ready" };

        UploadResponse {
            job_id: outcome.artifact.id.clone(),
            status: status.to_string(),
            artifact: outcome.artifact.key(),
            download_url: download_url(&outcome.artifact.id, &outcome.artifact.file_name),
            name_column: report.name_column,
            columns: report.columns,
            missing_columns: report.missing_columns,
            rows: report.rows,
            stats: report.stats,
        }
    }
}

pub fn download_url(id: &str, file_name: &str) -> String {
    format!("/api/download/{}/{}", id, file_name)
}

/// Catalog as served on `/api/columns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnsResponse {
    pub default: Vec<String>,
    pub harsh_handling: Vec<String>,
    pub additional: Vec<String>,
    pub name_aliases: Vec<String>,
}

impl From<&ColumnCatalog> for ColumnsResponse {
    fn from(catalog: &ColumnCatalog) -> Self {
        ColumnsResponse {
            default: catalog.group(ColumnGroup::Default),
            harsh_handling: catalog.group(ColumnGroup::HarshHandling),
            additional: catalog.group(ColumnGroup::Additional),
            name_aliases: catalog.name_aliases().to_vec(),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "rows": [],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ArtifactId;
    use crate::transform::pipeline::Report;

    fn outcome(missing: Vec<String>) -> ProcessOutcome {
        ProcessOutcome {
            report: Report {
                name_column: "Driver Name".into(),
                columns: vec!["U Turn".into()],
                missing_columns: missing,
                rows: vec![ResultRow {
                    name: "A".into(),
                    violations: "U Turn".into(),
                    violations_count: 1.0,
                }],
                stats: ReportStats {
                    input_rows: 2,
                    filtered_rows: 1,
                    drivers: 1,
                    skipped_unnamed: 0,
                },
            },
            artifact: ArtifactId {
                id: "0b5c4f5e-7d0e-4d7a-9a53-0e8f1f0c1a2b".into(),
                file_name: "daily_grid.xlsx".into(),
            },
        }
    }

    #[test]
    fn test_upload_response_json() {
        let response = UploadResponse::from(outcome(vec![]));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "ready");
        assert_eq!(
            json["downloadUrl"],
            "/api/download/0b5c4f5e-7d0e-4d7a-9a53-0e8f1f0c1a2b/daily_grid.xlsx"
        );
        assert_eq!(json["rows"][0]["violationsCount"], 1.0);
        assert_eq!(json["stats"]["filteredRows"], 1);
    }

    #[test]
    fn test_missing_columns_mark_warning() {
        let response = UploadResponse::from(outcome(vec!["High G".into()]));
        assert_eq!(response.status, "warning");
        assert_eq!(response.missing_columns, ["High G"]);
    }

    #[test]
    fn test_columns_response() {
        let response = ColumnsResponse::from(&ColumnCatalog::builtin());
        assert_eq!(response.default.len(), 8);
        assert_eq!(response.harsh_handling.len(), 3);
        assert_eq!(response.additional.len(), 5);
        assert_eq!(response.name_aliases, ["Driver Name", "Name"]);
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("No file provided");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "No file provided");
    }
}
