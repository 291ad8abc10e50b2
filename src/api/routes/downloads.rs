//! Download job handlers.

use super::json_body;
use crate::api::AppState;
use crate::error::Result;
use crate::protocol::{DownloadRequest, DownloadResponse, StatusResponse};
use axum::{
    Json,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// POST /api/download - Start producing one format of a session
#[utoipa::path(
    post,
    path = "/api/download",
    tag = "protocol",
    request_body = crate::protocol::DownloadRequest,
    responses(
        (status = 200, description = "Job started", body = crate::protocol::DownloadResponse),
        (status = 400, description = "Incomplete request, expired session or unknown format", body = crate::error::ApiError),
        (status = 503, description = "Server is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_download(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<DownloadResponse>> {
    let request = json_body(payload)?;

    let response = state.backend.start_download(
        request.session_id.as_deref(),
        request.format_id.as_deref(),
        request.format_type,
    )?;

    Ok(Json(response))
}

/// GET /api/status/:download_id - Poll a download job
#[utoipa::path(
    get,
    path = "/api/status/{download_id}",
    tag = "protocol",
    params(
        ("download_id" = String, Path, description = "Download job ID")
    ),
    responses(
        (status = 200, description = "Current status and progress", body = crate::protocol::StatusResponse),
        (status = 404, description = "Download not found", body = crate::error::ApiError),
        (status = 422, description = "The download failed", body = crate::error::ApiError)
    )
)]
pub async fn download_status(
    State(state): State<AppState>,
    Path(download_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    state.backend.status(&download_id).map(Json)
}

/// GET /download/:download_id - Fetch a completed file as an attachment
#[utoipa::path(
    get,
    path = "/download/{download_id}",
    tag = "files",
    params(
        ("download_id" = String, Path, description = "Download job ID")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "Download or file not found", body = crate::error::ApiError)
    )
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(download_id): Path<String>,
) -> Result<Response> {
    let path = state.backend.file(&download_id).await?;
    let file = tokio::fs::File::open(&path).await?;
    let length = file.metadata().await?.len();

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().replace('"', ""))
        .unwrap_or_else(|| download_id.clone());

    tracing::debug!(download_id = %download_id, path = %path.display(), "serving file");

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&file_name).to_string()),
            (header::CONTENT_LENGTH, length.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// MIME type from a file extension, defaulting to a generic binary type
fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("ogg" | "opus") => "audio/ogg",
        _ => "application/octet-stream",
    }
}
