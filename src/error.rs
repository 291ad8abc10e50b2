//! Error types for mediagrab
//!
//! This module provides error handling for both sides of the protocol:
//! - The client taxonomy (validation, remote, transport) that callers and views branch on
//! - Backend errors and their HTTP status code mapping
//! - The `{error}` wire body shared by every failing API call

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for mediagrab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Protocol call an error belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `POST /api/extract`
    Extract,
    /// `POST /api/download`
    StartDownload,
    /// `GET /api/status/{download_id}`
    PollStatus,
    /// `POST /api/cleanup`
    Cleanup,
}

impl Operation {
    /// Generic message shown to users when this call fails below the protocol level
    pub fn transport_message(self) -> &'static str {
        match self {
            Operation::Extract => {
                "An error occurred while extracting the media information. Please try again."
            }
            Operation::StartDownload => {
                "An error occurred while starting the download. Please try again."
            }
            Operation::PollStatus => "Lost contact with the server while checking progress.",
            Operation::Cleanup => "Could not release the session on the server.",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Extract => "extract",
            Operation::StartDownload => "start download",
            Operation::PollStatus => "poll status",
            Operation::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Main error type for mediagrab
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before any network interaction (empty URL, missing fields)
    #[error("validation error: {0}")]
    Validation(String),

    /// The backend answered with an explicit `{error}` payload
    #[error("{operation} rejected by server: {message}")]
    Remote {
        /// Call that was rejected
        operation: Operation,
        /// Message exactly as sent by the backend
        message: String,
    },

    /// Network failure or unparsable response
    #[error("transport error during {operation}: {detail}")]
    Transport {
        /// Call that failed
        operation: Operation,
        /// Diagnostic detail (not shown to users)
        detail: String,
    },

    /// Operation called in a state that makes it meaningless (caller bug)
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Response discarded because a newer session or job replaced the one it was issued for
    #[error("{operation} response superseded by a newer request")]
    Superseded {
        /// Call whose response was discarded
        operation: Operation,
    },

    /// Session unknown to the backend (never created, cleaned up or expired)
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// Requested format does not exist in the session
    #[error("unknown format {format_id} for session {session_id}")]
    UnknownFormat {
        /// Session that was searched
        session_id: String,
        /// Format that was requested
        format_id: String,
    },

    /// Download or file not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Produced file exceeds the configured size limit
    #[error("file size ({size} bytes) exceeds the allowed limit ({limit} bytes)")]
    FileTooLarge {
        /// Size of the produced file in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// A download job ended in failure; the message is shown verbatim
    #[error("download failed: {0}")]
    DownloadFailed(String),

    /// The media engine failed to extract or download
    #[error("media engine error: {0}")]
    Engine(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new work
    #[error("shutdown in progress: not accepting new work")]
    ShuttingDown,
}

impl Error {
    /// Build a transport error from any displayable cause
    pub fn transport(operation: Operation, detail: impl std::fmt::Display) -> Self {
        Error::Transport {
            operation,
            detail: detail.to_string(),
        }
    }

    /// Text a view should display for this error.
    ///
    /// Validation and remote messages are shown verbatim; transport failures
    /// get the generic message of the call that failed.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(message) => message.clone(),
            Error::Remote { message, .. } => message.clone(),
            Error::Transport { operation, .. } => operation.transport_message().to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this is a discarded stale response rather than a real failure
    pub fn is_superseded(&self) -> bool {
        matches!(self, Error::Superseded { .. })
    }
}

/// API error response body
///
/// Every failing call answers with this shape. `code` is an optional
/// machine-readable addition; clients only rely on `error`.
///
/// ```json
/// { "error": "Session expired. Please extract the media information again.", "code": "session_expired" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable message, suitable for displaying to end users
    pub error: String,

    /// Machine-readable error code (e.g., "not_found", "validation_error")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Validation(_) => 400,
            Error::Config { .. } => 400,
            Error::SessionExpired(_) => 400,
            Error::UnknownFormat { .. } => 400,
            Error::FileTooLarge { .. } => 400,
            Error::InvalidState(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 409 Conflict
            Error::Superseded { .. } => 409,

            // 422 Unprocessable Entity - the job ran and failed
            Error::DownloadFailed(_) => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Engine(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - errors relayed from another service
            Error::Remote { .. } => 502,
            Error::Transport { .. } => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Remote { .. } => "remote_error",
            Error::Transport { .. } => "transport_error",
            Error::InvalidState(_) => "invalid_state",
            Error::Superseded { .. } => "superseded",
            Error::SessionExpired(_) => "session_expired",
            Error::UnknownFormat { .. } => "unknown_format",
            Error::NotFound(_) => "not_found",
            Error::FileTooLarge { .. } => "file_too_large",
            Error::DownloadFailed(_) => "download_failed",
            Error::Engine(_) => "engine_error",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();

        // Messages shown to end users as-is
        let message = match &error {
            Error::Validation(message) => message.clone(),
            Error::SessionExpired(_) => {
                "Session expired. Please extract the media information again.".to_string()
            }
            Error::UnknownFormat { format_id, .. } => {
                format!("Format {format_id} is not available for this media.")
            }
            Error::NotFound(what) => what.clone(),
            Error::DownloadFailed(message) => message.clone(),
            Error::FileTooLarge { size, limit } => format!(
                "File size ({:.1} MB) exceeds the allowed limit ({:.1} MB).",
                *size as f64 / (1024.0 * 1024.0),
                *limit as f64 / (1024.0 * 1024.0)
            ),
            Error::Engine(detail) => {
                format!("An error occurred while processing the URL: {detail}")
            }
            other => other.to_string(),
        };

        ApiError {
            error: message,
            code: Some(code),
        }
    }
}
