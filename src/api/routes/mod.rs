//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`media`] - Extraction and session cleanup
//! - [`downloads`] - Download jobs and their files
//! - [`system`] - Health and OpenAPI

use crate::backend::BackendStats;
use crate::error::{Error, Result};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;

mod downloads;
mod media;
mod system;

// Re-export all handlers so `routes::function_name` works from the router
pub use downloads::*;
pub use media::*;
pub use system::*;

/// Response for GET /health
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "ok" while the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Registry counters
    pub backend: BackendStats,
}

/// Unwrap a JSON body, turning axum's rejection into a validation error so
/// that malformed requests still get the `{error}` shape
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected request body");
            Err(Error::Validation(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))
        }
    }
}
