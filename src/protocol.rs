//! Wire types of the backend HTTP contract
//!
//! | Call | Route | Request | Success |
//! |---|---|---|---|
//! | Extract | `POST /api/extract` | [`ExtractRequest`] | [`ExtractResponse`] |
//! | Start download | `POST /api/download` | [`DownloadRequest`] | [`DownloadResponse`] |
//! | Poll status | `GET /api/status/{download_id}` | - | [`StatusResponse`] |
//! | Cleanup | `POST /api/cleanup` | [`CleanupRequest`] | [`CleanupResponse`] |
//!
//! Every failure answers with [`ApiError`](crate::error::ApiError).

use crate::error::ApiError;
use crate::types::{Format, FormatKind, JobStatus, MediaInfo, Session, SessionId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/extract`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ExtractRequest {
    /// Media URL to inspect
    #[serde(default)]
    pub url: Option<String>,
}

/// Response body for `POST /api/extract`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExtractResponse {
    /// Always true on success
    #[serde(default = "default_success")]
    pub success: bool,
    /// Extracted media description
    pub video: VideoPayload,
}

/// Media description carried by [`ExtractResponse`]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoPayload {
    /// Session created for this extraction
    pub session_id: String,
    /// Source media identifier, if the engine has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Media title
    #[serde(default)]
    pub title: String,
    /// Channel or uploader
    #[serde(default)]
    pub author: String,
    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: String,
    /// Duration in seconds
    #[serde(default)]
    pub duration: u64,
    /// View count
    #[serde(default)]
    pub views: u64,
    /// Available formats
    #[serde(default)]
    pub formats: Vec<FormatPayload>,
}

/// One format entry of [`VideoPayload`]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormatPayload {
    /// Format identifier
    pub format_id: String,
    /// Video or audio
    #[serde(rename = "type")]
    pub kind: FormatKind,
    /// Display label
    #[serde(default)]
    pub resolution: String,
    /// Size in bytes, 0 or absent when unknown
    #[serde(default)]
    pub filesize: Option<u64>,
}

impl From<&Format> for FormatPayload {
    fn from(format: &Format) -> Self {
        Self {
            format_id: format.format_id.clone(),
            kind: format.kind,
            resolution: format.resolution_label.clone(),
            filesize: Some(format.size_bytes),
        }
    }
}

impl From<FormatPayload> for Format {
    fn from(payload: FormatPayload) -> Self {
        Self {
            format_id: payload.format_id,
            kind: payload.kind,
            resolution_label: payload.resolution,
            size_bytes: payload.filesize.unwrap_or(0),
        }
    }
}

impl VideoPayload {
    /// Build the payload for a session's media info
    pub fn new(session_id: &SessionId, info: &MediaInfo) -> Self {
        Self {
            session_id: session_id.to_string(),
            id: None,
            title: info.title.clone(),
            author: info.author.clone(),
            thumbnail: info.thumbnail.clone(),
            duration: info.duration_secs,
            views: info.views,
            formats: info.formats.iter().map(FormatPayload::from).collect(),
        }
    }

    /// Convert into a client session for the submitted URL
    pub fn into_session(self, source_url: &str) -> Session {
        Session {
            id: SessionId(self.session_id),
            source_url: source_url.to_string(),
            info: MediaInfo {
                title: self.title,
                author: self.author,
                thumbnail: self.thumbnail,
                duration_secs: self.duration,
                views: self.views,
                formats: self.formats.into_iter().map(Format::from).collect(),
            },
        }
    }
}

/// Request body for `POST /api/download`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DownloadRequest {
    /// Session the format belongs to
    #[serde(default)]
    pub session_id: Option<String>,
    /// Format to produce
    #[serde(default)]
    pub format_id: Option<String>,
    /// Kind of the format
    #[serde(default)]
    pub format_type: Option<FormatKind>,
}

/// Response body for `POST /api/download`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DownloadResponse {
    /// Always true on success
    #[serde(default = "default_success")]
    pub success: bool,
    /// New job identifier
    pub download_id: String,
    /// Where the file will be served once completed
    pub download_url: String,
}

/// Response body for `GET /api/status/{download_id}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// Current job status
    pub status: JobStatus,
    /// Progress in percent, 0..=100
    #[serde(default)]
    pub progress: u8,
}

/// Request body for `POST /api/cleanup`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CleanupRequest {
    /// Session to release
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response body for `POST /api/cleanup`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CleanupResponse {
    /// Always true
    pub success: bool,
}

fn default_success() -> bool {
    true
}

/// A parsed response body: either the `{error}` payload or the call's success shape
#[derive(Debug, Clone)]
pub enum Reply<T> {
    /// The call succeeded
    Ok(T),
    /// The backend reported an error
    Err(ApiError),
}

impl<T: DeserializeOwned> Reply<T> {
    /// Parse a body, letting an `error` field win over the success shape
    pub fn parse(body: &[u8]) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        if value.get("error").is_some_and(|e| !e.is_null()) {
            return serde_json::from_value(value).map(Reply::Err);
        }
        serde_json::from_value(value).map(Reply::Ok)
    }
}
