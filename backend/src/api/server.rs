//! HTTP Server for the driver grid service.
//!
//! # API Endpoints
//!
//! | Method | Path                               | Description                       |
//! |--------|------------------------------------|-----------------------------------|
//! | GET    | `/`                                | Upload form                       |
//! | POST   | `/upload`                          | Form upload, HTML result page     |
//! | GET    | `/health`                          | Health check                      |
//! | GET    | `/api/columns`                     | Violation column catalog          |
//! | POST   | `/api/upload`                      | Multipart upload, JSON summary    |
//! | GET    | `/api/download/{id}/{file_name}`   | Stream a stored workbook          |
//! | GET    | `/api/logs`                        | SSE stream for pipeline logs      |
//!
//! Upload fields: `file`, `columns` (repeatable), `harsh_handling`,
//! `individual_count`.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Html, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, ColumnsResponse, UploadResponse};
use crate::config::AppConfig;
use crate::error::{ParseError, PipelineError, ServerError, ServerResult, StorageError};
use crate::parser::{ParseOptions, TableFormat};
use crate::schema::{ColumnCatalog, ColumnGroup, Selection};
use crate::storage::ArtifactStore;
use crate::transform::pipeline::{process_upload, PipelineOptions};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ColumnCatalog>,
    pub store: ArtifactStore,
    pub options: PipelineOptions,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            catalog: Arc::new(ColumnCatalog::builtin()),
            store: ArtifactStore::with_dir(&config.storage_dir),
            options: PipelineOptions {
                parse: ParseOptions {
                    metadata_lines: config.metadata_lines,
                    delimiter: None,
                },
            },
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload_form))
        .route("/health", get(health))
        .route("/api/columns", get(columns))
        .route("/api/upload", post(upload_json))
        .route("/api/download/{id}/{file_name}", get(download))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::from_config(&config), config.max_upload_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("driver grid server running on http://localhost:{}", config.port);
    tracing::info!("artifacts stored under {}", config.storage_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "driver-grid",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "download": "GET /api/download/{id}/{file_name}",
            "columns": "GET /api/columns",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn columns(State(state): State<AppState>) -> Json<ColumnsResponse> {
    Json(ColumnsResponse::from(state.catalog.as_ref()))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(upload_form_page(&state.catalog))
}

/// Upload endpoint, JSON in and out.
async fn upload_json(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let upload = read_upload(multipart).await?;
    let response = run_upload(state, upload).await?;
    Ok(Json(response))
}

/// Upload endpoint behind the HTML form.
async fn upload_form(State(state): State<AppState>, multipart: Multipart) -> Response {
    let result = match read_upload(multipart).await {
        Ok(upload) => run_upload(state, upload).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Html(result_page(&response)).into_response(),
        Err(e) => {
            log_error(e.to_string());
            (e.status_code(), Html(error_page(&e.to_string()))).into_response()
        }
    }
}

/// Stream a stored workbook back as an attachment.
async fn download(
    State(state): State<AppState>,
    Path((id, file_name)): Path<(String, String)>,
) -> ServerResult<Response> {
    let bytes = state.store.load(&id, &file_name)?;
    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// =============================================================================
// Upload intake
// =============================================================================

/// Raw form input for one upload.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file_name: Option<String>,
    pub bytes: Option<Vec<u8>>,
    pub columns: Vec<String>,
    pub harsh_handling: bool,
    pub individual_count: bool,
}

async fn read_upload(mut multipart: Multipart) -> ServerResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                form.bytes = Some(bytes.to_vec());
            }
            "columns" | "harsh_handling" | "individual_count" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                match name.as_str() {
                    "columns" => form.columns.extend(split_columns(&value)),
                    "harsh_handling" => form.harsh_handling = is_checked(&value),
                    _ => form.individual_count = is_checked(&value),
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Validate the form and run the pipeline off the async runtime.
async fn run_upload(state: AppState, form: UploadForm) -> ServerResult<UploadResponse> {
    let file_name = form
        .file_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    if TableFormat::detect(&file_name).is_none() {
        return Err(PipelineError::UnsupportedFormat(file_name).into());
    }

    let bytes = form
        .bytes
        .ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    let selection = Selection::new(
        &state.catalog,
        &form.columns,
        form.harsh_handling,
        form.individual_count,
    )
    .map_err(PipelineError::from)?;

    log_info(format!("📄 New upload: {} ({} bytes)", file_name, bytes.len()));

    let outcome = tokio::task::spawn_blocking(move || {
        process_upload(
            &bytes,
            &file_name,
            &state.catalog,
            &selection,
            &state.options,
            &state.store,
        )
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(UploadResponse::from(outcome))
}

/// Form values may be repeated fields or one comma-separated field.
fn split_columns(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn is_checked(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

// =============================================================================
// Errors
// =============================================================================

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(PipelineError::UnsupportedFormat(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ServerError::Pipeline(PipelineError::Parse(ParseError::Io(_))) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::Pipeline(PipelineError::Parse(_))
            | ServerError::Pipeline(PipelineError::Schema(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Storage(StorageError::NotFound(_))
            | ServerError::Storage(StorageError::InvalidName(_)) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) | ServerError::Storage(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        log_error(self.to_string());
        (self.status_code(), Json(error_response(&self.to_string()))).into_response()
    }
}

// =============================================================================
// Pages
// =============================================================================

const PAGE_TITLE: &str = "Driver Violations Grid";

const INSTRUCTIONS: &str = "<div id=\"instructions\">\n\
<p>Steps:</p>\n\
<ol>\n\
<li>In the performance portal, open Reports, then Driver Report.</li>\n\
<li>Pick the Daily view and a date, switch on the Summary option, and download the report.</li>\n\
<li>Choose the downloaded file below, select the violations to include, and click Upload.</li>\n\
<li>On the result page, click Download to get the grid workbook, ready to paste into an email.</li>\n\
</ol>\n\
<p>An error usually means the wrong file was uploaded: a report downloaded without the \
Summary option, or a raw event export instead of the driver report.</p>\n\
</div>";

fn page(body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n<h3>{title}</h3>\n{body}\n</body>\n</html>\n",
        title = PAGE_TITLE,
        body = body
    )
}

fn upload_form_page(catalog: &ColumnCatalog) -> String {
    let checkbox = |name: &str, checked: bool| {
        format!(
            "<label><input type=\"checkbox\" name=\"columns\" value=\"{0}\"{1}> {0}</label><br>",
            escape_html(name),
            if checked { " checked" } else { "" }
        )
    };

    let default: String = catalog
        .group(ColumnGroup::Default)
        .iter()
        .map(|c| checkbox(c, true))
        .collect();
    let additional: String = catalog
        .group(ColumnGroup::Additional)
        .iter()
        .map(|c| checkbox(c, false))
        .collect();
    let harsh = catalog.group(ColumnGroup::HarshHandling).join(", ");

    page(&format!(
        "{instructions}\n<form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\".xlsx,.xlsm,.xlsb,.xls,.ods,.csv,.tsv,.txt\"><br><br>\n\
         <fieldset><legend>Violations</legend>{default}</fieldset>\n\
         <fieldset><legend>Harsh handling</legend>\
         <label><input type=\"checkbox\" name=\"harsh_handling\" value=\"on\"> {harsh}</label></fieldset>\n\
         <fieldset><legend>Additional</legend>{additional}</fieldset>\n\
         <label><input type=\"checkbox\" name=\"individual_count\" value=\"on\"> Show individual counts</label><br><br>\n\
         <input type=\"submit\" value=\"Upload\">\n\
         </form>",
        instructions = INSTRUCTIONS,
        default = default,
        harsh = escape_html(&harsh),
        additional = additional
    ))
}

fn result_page(response: &UploadResponse) -> String {
    let warning = if response.missing_columns.is_empty() {
        String::new()
    } else {
        format!(
            "<p>Columns not found in the report: {}</p>\n",
            escape_html(&response.missing_columns.join(", "))
        )
    };
    page(&format!(
        "<p>File processed successfully! {} driver(s) with violations.</p>\n{}\
         <a href=\"{}\"><button>Download</button></a>",
        response.rows.len(),
        warning,
        escape_html(&response.download_url)
    ))
}

fn error_page(message: &str) -> String {
    page(&format!(
        "<h4>Error</h4>\n<p>{}</p>\n<a href=\"/\">Return to upload form</a>",
        escape_html(message)
    ))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use tempfile::tempdir;

    fn state(dir: &std::path::Path) -> AppState {
        AppState {
            catalog: Arc::new(ColumnCatalog::builtin()),
            store: ArtifactStore::with_dir(dir),
            options: PipelineOptions::default(),
        }
    }

    fn csv_form(file_name: &str) -> UploadForm {
        let preamble: String = (0..10).map(|i| format!("meta {}\n", i)).collect();
        UploadForm {
            file_name: Some(file_name.to_string()),
            bytes: Some(format!("{}Driver Name;U Turn;Hard Turn\nA;1;2\nB;0;0\n", preamble).into_bytes()),
            columns: vec!["U Turn".into()],
            harsh_handling: true,
            individual_count: true,
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ServerError::from(PipelineError::UnsupportedFormat("a.pdf".into())), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (ServerError::from(PipelineError::Parse(ParseError::EmptyFile)), StatusCode::UNPROCESSABLE_ENTITY),
            (
                ServerError::from(PipelineError::Schema(SchemaError::UnknownColumn("x".into()))),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ServerError::from(StorageError::NotFound("x".into())), StatusCode::NOT_FOUND),
            (ServerError::BadRequest("no file".into()), StatusCode::BAD_REQUEST),
            (ServerError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{}", err);
        }
    }

    #[test]
    fn test_form_helpers() {
        assert_eq!(split_columns("U Turn, High G ,"), ["U Turn", "High G"]);
        assert!(is_checked("on"));
        assert!(is_checked("TRUE"));
        assert!(!is_checked("off"));
        assert!(!is_checked(""));
    }

    #[test]
    fn test_upload_form_page_lists_catalog() {
        let html = upload_form_page(&ColumnCatalog::builtin());
        assert!(html.contains("value=\"Following Distance\" checked"));
        assert!(html.contains("value=\"High G\">"));
        assert!(html.contains("Hard Braking, Hard Acceleration, Hard Turn"));
        assert!(html.contains("name=\"individual_count\""));
        assert!(html.contains("id=\"instructions\""));
        assert!(html.contains("Summary option"));
        assert!(html.find("instructions") < html.find("<form"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[tokio::test]
    async fn test_run_upload_and_download() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());

        let response = run_upload(state.clone(), csv_form("daily.csv")).await.unwrap();
        // Hard Braking and Hard Acceleration are not in the upload
        assert_eq!(response.status, "warning");
        assert_eq!(response.missing_columns, ["Hard Braking", "Hard Acceleration"]);
        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.rows[0].violations, "U Turn (1), Hard Turn (2)");
        assert_eq!(response.rows[0].violations_count, 3.0);

        let (id, file_name) = response.artifact.split_once('/').unwrap();
        assert_eq!(file_name, "daily_grid.xlsx");
        let resp = download(State(state), Path((id.to_string(), file_name.to_string())))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"daily_grid.xlsx\""
        );
    }

    #[tokio::test]
    async fn test_download_missing_is_404() {
        let dir = tempdir().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        let err = download(State(state(dir.path())), Path((id, "gone_grid.xlsx".to_string())))
            .await
            .err()
            .expect("artifact should be missing");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_upload_rejects_extension() {
        let dir = tempdir().unwrap();
        let err = run_upload(state(dir.path()), csv_form("daily.pdf")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_run_upload_requires_file() {
        let dir = tempdir().unwrap();
        let err = run_upload(state(dir.path()), UploadForm::default()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
