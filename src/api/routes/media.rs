//! Extraction and session cleanup handlers.

use super::json_body;
use crate::api::AppState;
use crate::error::Result;
use crate::protocol::{CleanupRequest, CleanupResponse, ExtractRequest, ExtractResponse, VideoPayload};
use axum::{Json, extract::State, extract::rejection::JsonRejection};

/// POST /api/extract - Inspect a media URL and open a session
#[utoipa::path(
    post,
    path = "/api/extract",
    tag = "protocol",
    request_body = crate::protocol::ExtractRequest,
    responses(
        (status = 200, description = "Media information and a new session", body = crate::protocol::ExtractResponse),
        (status = 400, description = "Missing or unsupported URL", body = crate::error::ApiError),
        (status = 500, description = "The media engine failed", body = crate::error::ApiError),
        (status = 503, description = "Server is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn extract(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>> {
    let request = json_body(payload)?;
    let url = request.url.unwrap_or_default();

    let session = state.backend.extract(&url).await?;

    Ok(Json(ExtractResponse {
        success: true,
        video: VideoPayload::new(&session.id, &session.info),
    }))
}

/// POST /api/cleanup - Release a session, its jobs and their files
#[utoipa::path(
    post,
    path = "/api/cleanup",
    tag = "protocol",
    request_body = crate::protocol::CleanupRequest,
    responses(
        (status = 200, description = "Session released (or already gone)", body = crate::protocol::CleanupResponse),
        (status = 400, description = "Missing session id", body = crate::error::ApiError)
    )
)]
pub async fn cleanup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CleanupRequest>, JsonRejection>,
) -> Result<Json<CleanupResponse>> {
    let request = json_body(payload)?;
    let session_id = request.session_id.unwrap_or_default();

    state.backend.cleanup(&session_id).await?;

    Ok(Json(CleanupResponse { success: true }))
}
