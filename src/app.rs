use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::Config;
use crate::error::AppError;
use crate::graph::{PlotRenderer, PlottersRenderer};
use crate::loader::load_dataset;
use crate::plot::{self, GeneratePlotRequest, GenerateResponse, PlotRequest};
use crate::storage::Storage;

/// Shared state of every handler
pub struct AppState {
    storage: Storage,
    renderer: Arc<dyn PlotRenderer>,
}

impl AppState {
    pub fn new(storage: Storage, renderer: Arc<dyn PlotRenderer>) -> Self {
        AppState { storage, renderer }
    }
}

/// Body returned after a successful upload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub upload_id: String,
    pub column_names: Vec<String>,
    pub original_filename: String,
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::new(&config.upload_dir, &config.output_dir)?;
    let state = Arc::new(AppState::new(storage, Arc::new(PlottersRenderer)));
    let app = router(state, config.max_upload_bytes());

    // Start server
    let listener = TcpListener::bind(config.bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with every endpoint
///
/// Request bodies above `max_upload_bytes` are refused with 413.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/upload_file", post(upload_file))
        .route("/generate_plot", post(generate_plot))
        .route("/outputs/:upload_id/:filename", get(fetch_image))
        .route("/download_zip/:zip_name", get(fetch_archive))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

/// Store an uploaded spreadsheet and report its columns
///
/// The file is taken from the multipart part named `file`.
///
/// # Returns
/// * `Result<Json<UploadResponse>, AppError>` - Upload id, column names and
///   the original file name; 400 when the part or its file name is missing
async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, bytes));
    }

    let (filename, bytes) = upload.ok_or(AppError::MissingFile)?;
    if filename.trim().is_empty() {
        return Err(AppError::EmptyFilename);
    }

    let response = blocking(state, move |state| {
        let handle = state.storage.save_upload(&filename, &bytes)?;
        let dataset = load_dataset(&handle.path)?;
        info!(
            "stored upload {} ({}, {} rows)",
            handle.upload_id,
            handle.original_filename,
            dataset.len()
        );

        Ok(UploadResponse {
            upload_id: handle.upload_id,
            column_names: dataset.columns().to_vec(),
            original_filename: handle.original_filename,
        })
    })
    .await?;

    Ok(Json(response))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::TooLarge
    } else {
        AppError::InvalidRequest(e.body_text())
    }
}

async fn generate_plot(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GeneratePlotRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(raw) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let request = PlotRequest::try_from(raw)?;
    let timestamp = Utc::now().timestamp_millis();

    let response = blocking(state, move |state| {
        plot::generate(&state.storage, state.renderer.as_ref(), &request, timestamp)
    })
    .await?;

    Ok(Json(response))
}

async fn fetch_image(
    State(state): State<Arc<AppState>>,
    Path((upload_id, filename)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (name, bytes) =
        blocking(state, move |state| state.storage.read_image(&upload_id, &filename)).await?;
    Ok(attachment(&name, bytes))
}

async fn fetch_archive(
    State(state): State<Arc<AppState>>,
    Path(zip_name): Path<String>,
) -> Result<Response, AppError> {
    let (name, bytes) = blocking(state, move |state| state.storage.read_archive(&zip_name)).await?;
    Ok(attachment(&name, bytes))
}

/// Run filesystem and plotting work off the async executor
async fn blocking<T, F>(state: Arc<AppState>, work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| AppError::Join(e.to_string()))?
}

/// File body served as a download
fn attachment(name: &str, bytes: Vec<u8>) -> Response {
    let content_type = match name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    };

    let fallback: String = name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    );
    let disposition =
        HeaderValue::from_str(&disposition).unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}
