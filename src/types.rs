//! Core types and events for mediagrab

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque session identifier issued by the backend
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Allocate a fresh random identifier (backend side)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque download job identifier issued by the backend
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Allocate a fresh random identifier (backend side)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of a downloadable format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// Video stream (may include audio)
    Video,
    /// Audio-only stream
    Audio,
}

impl FormatKind {
    /// Wire name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            FormatKind::Video => "video",
            FormatKind::Audio => "audio",
        }
    }
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable encoding/quality variant of the source media
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    /// Identifier, unique within its session
    pub format_id: String,
    /// Video or audio
    pub kind: FormatKind,
    /// Display label (e.g. "720p", "128kbps")
    pub resolution_label: String,
    /// Size in bytes; 0 means unknown
    pub size_bytes: u64,
}

impl Format {
    /// Size in bytes if the backend knows it
    pub fn known_size(&self) -> Option<u64> {
        (self.size_bytes > 0).then_some(self.size_bytes)
    }
}

/// Metadata and formats extracted for one source URL
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Media title
    pub title: String,
    /// Channel or uploader
    pub author: String,
    /// Thumbnail URL
    pub thumbnail: String,
    /// Duration in seconds
    pub duration_secs: u64,
    /// View count
    pub views: u64,
    /// Available formats, in backend order
    pub formats: Vec<Format>,
}

impl MediaInfo {
    /// Formats of one kind, preserving backend order
    pub fn formats_of(&self, kind: FormatKind) -> impl Iterator<Item = &Format> {
        self.formats.iter().filter(move |f| f.kind == kind)
    }

    /// Split formats into (video, audio), each in backend order
    pub fn partition(&self) -> (Vec<&Format>, Vec<&Format>) {
        self.formats.iter().partition(|f| f.kind == FormatKind::Video)
    }

    /// Look up a format by identifier
    pub fn find_format(&self, format_id: &str) -> Option<&Format> {
        self.formats.iter().find(|f| f.format_id == format_id)
    }
}

/// Client-held view of one inspection session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Backend-issued identifier
    pub id: SessionId,
    /// URL the user submitted
    pub source_url: String,
    /// Extracted metadata and formats (read-only after creation)
    pub info: MediaInfo,
}

impl Session {
    /// Formats of the session
    pub fn formats(&self) -> &[Format] {
        &self.info.formats
    }
}

/// Download job status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, nothing transferred yet
    Preparing,
    /// Transfer in progress
    Downloading,
    /// File ready at the download URL
    Completed,
    /// Terminal failure
    Failed,
}

impl JobStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Preparing => 0,
            JobStatus::Downloading => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    /// Whether moving from `self` to `next` respects the job state machine
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next.rank() >= self.rank()
    }

    /// Human-readable phase message for progress displays
    pub fn phase_message(self, percent: u8) -> String {
        match self {
            JobStatus::Preparing => "Preparing file...".to_string(),
            JobStatus::Downloading => format!("Downloading... {percent}%"),
            JobStatus::Completed => "Download complete".to_string(),
            JobStatus::Failed => "Download failed".to_string(),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Preparing => "preparing",
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Client-held view of one download job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Backend-issued identifier
    pub id: JobId,
    /// Session the job belongs to
    pub session_id: SessionId,
    /// Format being produced
    pub format_id: String,
    /// Kind of the format
    pub kind: FormatKind,
    /// Current status
    pub status: JobStatus,
    /// Progress in percent, 0..=100
    pub progress_percent: u8,
    /// Where the file can be fetched once completed
    pub download_url: String,
    /// Failure message once failed
    pub error: Option<String>,
}

impl Job {
    /// A freshly started job
    pub fn started(
        id: JobId,
        session_id: SessionId,
        format_id: String,
        kind: FormatKind,
        download_url: String,
    ) -> Self {
        Self {
            id,
            session_id,
            format_id,
            kind,
            status: JobStatus::Preparing,
            progress_percent: 0,
            download_url,
            error: None,
        }
    }

    /// Apply a polled status.
    ///
    /// Returns false (and leaves the job untouched) once the job is terminal.
    /// Status never moves backwards and progress never decreases.
    pub fn apply_status(&mut self, status: JobStatus, percent: u8) -> bool {
        if !self.status.can_transition_to(status) {
            return false;
        }
        if status == JobStatus::Failed {
            self.status = JobStatus::Failed;
            return true;
        }
        if status.rank() > self.status.rank() {
            self.status = status;
        }
        let percent = if status == JobStatus::Completed {
            100
        } else {
            percent.min(100)
        };
        self.progress_percent = self.progress_percent.max(percent);
        true
    }

    /// Mark as failed with a message; no-op when already terminal
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.error = Some(message.into());
        true
    }
}

/// Event emitted by the client controllers for views to render
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An extraction request is in flight
    Loading {
        /// Submitted URL
        url: String,
    },

    /// Extraction succeeded; formats can be picked
    SessionReady {
        /// The new session
        session: Session,
    },

    /// A download job was accepted by the backend
    JobStarted {
        /// Job identifier
        job_id: JobId,
        /// Session the job belongs to
        session_id: SessionId,
    },

    /// Polling observed progress on the active job
    Progress {
        /// Job identifier
        job_id: JobId,
        /// Current status
        status: JobStatus,
        /// Progress in percent
        percent: u8,
        /// Human-readable phase message
        phase: String,
    },

    /// The active job completed
    Completed {
        /// Job identifier
        job_id: JobId,
        /// Where the produced file can be fetched
        download_url: String,
    },

    /// A terminal error for the current attempt
    Error {
        /// Job the error belongs to, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        job_id: Option<JobId>,
        /// Message to display
        message: String,
    },

    /// No progress for the configured stall ceiling (a hung extraction has no job)
    Stalled {
        /// Job identifier, absent while extracting
        #[serde(skip_serializing_if = "Option::is_none")]
        job_id: Option<JobId>,
        /// Seconds since the last progress change
        idle_secs: u64,
    },

    /// Session and job state were discarded
    Reset,
}
