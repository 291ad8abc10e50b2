//! Pluggable media engine used by the backend

use super::Registry;
use crate::types::{Format, JobId, JobStatus, MediaInfo};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything an engine needs to produce one file
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Job being served
    pub job_id: JobId,
    /// URL the session was extracted from
    pub source_url: String,
    /// Format to produce
    pub format: Format,
    /// Directory the file must be written to
    pub output_dir: PathBuf,
    /// Cancelled when the session is cleaned up or the backend shuts down
    pub cancel: CancellationToken,
}

/// Handle an engine uses to report download progress
///
/// Reports are clamped to 0..=99 and never lower the recorded progress; the
/// first report moves the job from preparing to downloading. Only the
/// backend marks a job completed.
#[derive(Clone)]
pub struct ProgressSink {
    registry: Arc<Mutex<Registry>>,
    job_id: JobId,
}

impl ProgressSink {
    pub(crate) fn new(registry: Arc<Mutex<Registry>>, job_id: JobId) -> Self {
        Self { registry, job_id }
    }

    /// Record progress in percent
    pub fn report(&self, percent: f64) {
        let percent = if percent.is_finite() {
            percent.clamp(0.0, 99.0) as u8
        } else {
            0
        };

        let mut registry = self.registry.lock();
        let Some(job) = registry.jobs.get_mut(&self.job_id) else {
            return;
        };
        if job.status.is_terminal() {
            return;
        }
        job.status = JobStatus::Downloading;
        job.progress = job.progress.max(percent);
    }

    /// Record progress from byte counts; an unknown total only marks the job downloading
    pub fn report_bytes(&self, downloaded: u64, total: Option<u64>) {
        match total {
            Some(total) if total > 0 => self.report(downloaded as f64 * 100.0 / total as f64),
            _ => self.report(0.0),
        }
    }
}

/// Extracts media information and produces files
///
/// The backend owns sessions, jobs and the HTTP contract; an engine only
/// knows how to talk to the media source.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Whether the engine can handle `url`
    ///
    /// The default accepts any absolute http(s) URL.
    fn accepts(&self, url: &str) -> bool {
        crate::utils::is_http_url(url)
    }

    /// Extract title, metadata and the available formats of `url`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`](crate::Error::Engine) when the source cannot
    /// be inspected. The backend rejects an empty format list.
    async fn extract(&self, url: &str) -> crate::Result<MediaInfo>;

    /// Produce the requested format inside `request.output_dir`
    ///
    /// Implementations should report progress through `progress` and stop
    /// early once `request.cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`](crate::Error::Engine) when the download fails.
    async fn fetch(&self, request: FetchRequest, progress: ProgressSink)
    -> crate::Result<PathBuf>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
