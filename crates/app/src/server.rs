use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path as UrlPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pdf_bm25_core::{
    content_digest, extract_text, ingest_folder_into, DocumentSummary, IndexStatus, IngestError,
    IngestionOptions, IngestionReport, SearchError, SearchHit, SearchService, DEFAULT_RESULT_LIMIT,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct ServerConfig {
    pub upload_dir: PathBuf,
    pub demo_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub default_max_pages: Option<usize>,
}

#[derive(Clone)]
pub struct AppState {
    pub service: SearchService,
    pub config: Arc<ServerConfig>,
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/documents", get(list_documents))
        .route("/documents/:id", get(get_document))
        .route("/upload", post(upload))
        .route("/load_demo", post(load_demo))
        .route("/reindex", post(reindex))
        .route("/search", get(search))
        .route("/reset", post(reset))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub enum ApiError {
    Search(SearchError),
    Ingest(IngestError),
    BadRequest(String),
    Multipart(MultipartError),
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        Self::Multipart(error)
    }
}

impl From<SearchError> for ApiError {
    fn from(error: SearchError) -> Self {
        Self::Search(error)
    }
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        Self::Ingest(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Search(error) => {
                let status = match error {
                    SearchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    SearchError::NotFound(_) => StatusCode::NOT_FOUND,
                    SearchError::DuplicateId(_) => StatusCode::CONFLICT,
                };
                (status, error.to_string())
            }
            Self::Ingest(error) => {
                let status = match error {
                    IngestError::NotFound(_) => StatusCode::NOT_FOUND,
                    IngestError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    IngestError::InvalidArgument(_) | IngestError::MissingFileName(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    IngestError::PdfParse(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    IngestError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, error.to_string())
            }
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Multipart(error) => (error.status(), error.body_text()),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        } else {
            tracing::debug!(%status, error = %message, "request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn stats(State(state): State<AppState>) -> Json<IndexStatus> {
    Json(state.service.status().await)
}

async fn list_documents(State(state): State<AppState>) -> Json<Vec<DocumentSummary>> {
    Json(state.service.documents().await)
}

async fn get_document(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<DocumentSummary>, ApiError> {
    Ok(Json(state.service.document(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PageCapParams {
    pub max_pages: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub doc_id: String,
    pub filename: String,
    pub text_chars: usize,
}

async fn upload(
    State(state): State<AppState>,
    Query(params): Query<PageCapParams>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let data = field.bytes().await?;
        upload = Some((filename, data.to_vec()));
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::BadRequest("missing multipart field `file`".to_string()))?;

    let filename = sanitize_filename(&filename);
    let is_pdf = Path::new(&filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(IngestError::UnsupportedFormat(filename).into());
    }

    let doc_id = content_digest(&data);
    if state.service.document(&doc_id).await.is_ok() {
        return Err(SearchError::DuplicateId(doc_id).into());
    }

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(IngestError::Io)?;

    let stored_path = state.config.upload_dir.join(format!("{doc_id}_{filename}"));
    tokio::fs::write(&stored_path, &data)
        .await
        .map_err(IngestError::Io)?;

    let max_pages = params.max_pages.or(state.config.default_max_pages);
    let summary = match index_upload(&state, &stored_path, &doc_id, &filename, max_pages).await {
        Ok(summary) => summary,
        Err(error) => {
            if let Err(remove_error) = tokio::fs::remove_file(&stored_path).await {
                tracing::warn!(
                    path = %stored_path.display(),
                    error = %remove_error,
                    "failed to remove rejected upload"
                );
            }
            return Err(error);
        }
    };
    tracing::info!(doc_id = %summary.doc_id, filename = %summary.filename, text_chars = summary.text_chars, "uploaded pdf");

    Ok(Json(UploadResponse {
        doc_id: summary.doc_id,
        filename: summary.filename,
        text_chars: summary.text_chars,
    }))
}

async fn index_upload(
    state: &AppState,
    stored_path: &Path,
    doc_id: &str,
    filename: &str,
    max_pages: Option<usize>,
) -> Result<DocumentSummary, ApiError> {
    let path = stored_path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || extract_text(&path, max_pages))
        .await
        .map_err(|error| IngestError::PdfParse(format!("extraction task failed: {error}")))??;

    Ok(state.service.add(doc_id, filename, &text).await?)
}

async fn load_demo(
    State(state): State<AppState>,
    Query(params): Query<PageCapParams>,
) -> Result<Json<IngestionReport>, ApiError> {
    let folder = state
        .config
        .demo_dir
        .clone()
        .ok_or_else(|| ApiError::BadRequest("no demo folder is configured".to_string()))?;

    let options = IngestionOptions {
        max_pages: params.max_pages.or(state.config.default_max_pages),
        ..IngestionOptions::default()
    };
    let report = ingest_folder_into(&state.service, folder, options).await?;
    tracing::info!(
        added = report.added.len(),
        skipped = report.skipped.len(),
        "loaded demo folder"
    );
    Ok(Json(report))
}

async fn reindex(State(state): State<AppState>) -> Json<IndexStatus> {
    Json(state.service.rebuild().await)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    if params.q.trim().is_empty() {
        return Err(SearchError::InvalidInput("query is empty".to_string()).into());
    }

    let limit = params.k.unwrap_or(DEFAULT_RESULT_LIMIT);
    let results = state.service.search(&params.q, limit).await?;

    Ok(Json(SearchResponse {
        query: params.q,
        results,
    }))
}

async fn reset(State(state): State<AppState>) -> Json<IndexStatus> {
    Json(state.service.reset().await)
}

/// Keeps only the final path component and replaces characters that are
/// awkward in file names.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();

    if cleaned.trim_matches('.').is_empty() {
        "upload.pdf".to_string()
    } else {
        cleaned
    }
}
