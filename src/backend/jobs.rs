//! Download jobs: start, run, report status, serve the file

use super::engine::{FetchRequest, ProgressSink};
use super::{JobEntry, MediaBackend};
use crate::error::{ApiError, Error, Result};
use crate::protocol::{DownloadResponse, StatusResponse};
use crate::types::{FormatKind, JobId, JobStatus, SessionId};
use crate::utils::download_link;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tokio::time::Instant;

/// Rejection for a start call missing one of its fields
pub(crate) const INCOMPLETE_MESSAGE: &str = "Incomplete data.";

/// Status error for unknown job ids
pub(crate) const DOWNLOAD_NOT_FOUND: &str = "Download not found.";

/// Error for a file that is not (or no longer) available
pub(crate) const FILE_NOT_FOUND: &str = "File not found.";

/// Failure message when the engine gives no detail
pub(crate) const DOWNLOAD_FAILED: &str = "Download failed. Please try again.";

impl MediaBackend {
    /// Start producing `format_id` for a session
    ///
    /// Every call allocates a fresh job id; concurrent calls for the same
    /// format are not merged.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] when any field is missing
    /// - [`Error::SessionExpired`] for an unknown session
    /// - [`Error::UnknownFormat`] when the session has no such format of that kind
    pub fn start_download(
        &self,
        session_id: Option<&str>,
        format_id: Option<&str>,
        kind: Option<FormatKind>,
    ) -> Result<DownloadResponse> {
        self.ensure_accepting()?;

        let (Some(session_id), Some(format_id), Some(kind)) = (
            session_id.filter(|s| !s.trim().is_empty()),
            format_id.filter(|f| !f.trim().is_empty()),
            kind,
        ) else {
            return Err(Error::Validation(INCOMPLETE_MESSAGE.to_string()));
        };
        let session_id = SessionId::from(session_id);

        let job_id = JobId::generate();
        let request = {
            let mut registry = self.registry.lock();
            let session = registry
                .sessions
                .get_mut(&session_id)
                .ok_or_else(|| Error::SessionExpired(session_id.to_string()))?;
            session.last_access = Instant::now();

            let format = session
                .info
                .find_format(format_id)
                .filter(|f| f.kind == kind)
                .cloned()
                .ok_or_else(|| Error::UnknownFormat {
                    session_id: session_id.to_string(),
                    format_id: format_id.to_string(),
                })?;

            let cancel = self.shutdown_token.child_token();
            session.jobs.push(job_id.clone());
            let request = FetchRequest {
                job_id: job_id.clone(),
                source_url: session.url.clone(),
                format,
                output_dir: self.config.download_dir.clone(),
                cancel: cancel.clone(),
            };
            registry.jobs.insert(
                job_id.clone(),
                JobEntry {
                    session_id: session_id.clone(),
                    status: JobStatus::Preparing,
                    progress: 0,
                    file: None,
                    error: None,
                    cancel,
                },
            );
            request
        };

        tracing::info!(
            download_id = %job_id,
            session_id = %session_id,
            format_id,
            kind = %kind,
            "download started"
        );

        self.active_jobs.fetch_add(1, Ordering::SeqCst);
        let backend = self.clone();
        tokio::spawn(async move {
            backend.run_job(request).await;
            backend.active_jobs.fetch_sub(1, Ordering::SeqCst);
        });

        Ok(DownloadResponse {
            success: true,
            download_url: download_link(self.config.public_base_url.as_deref(), job_id.as_str()),
            download_id: job_id.0,
        })
    }

    /// Run the engine for one job and record the outcome
    async fn run_job(&self, request: FetchRequest) {
        let job_id = request.job_id.clone();
        let cancel = request.cancel.clone();
        let progress = ProgressSink::new(self.registry.clone(), job_id.clone());

        let result = tokio::select! {
            result = self.engine.fetch(request, progress) => result,
            _ = cancel.cancelled() => {
                tracing::debug!(download_id = %job_id, "download cancelled");
                return;
            }
        };

        match result {
            Ok(path) => self.finish_job(&job_id, path).await,
            Err(e) => {
                tracing::error!(download_id = %job_id, error = %e, "download failed");
                self.fail_job(&job_id, failure_message(&e));
            }
        }
    }

    async fn finish_job(&self, job_id: &JobId, path: PathBuf) {
        let size = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::error!(download_id = %job_id, path = %path.display(), error = %e, "produced file is unreadable");
                self.fail_job(job_id, DOWNLOAD_FAILED.to_string());
                return;
            }
        };

        let limit = self.config.max_file_size;
        if size > limit {
            tracing::warn!(download_id = %job_id, size, limit, "produced file exceeds size limit");
            super::sessions::remove_files(vec![path]).await;
            self.fail_job(job_id, ApiError::from(Error::FileTooLarge { size, limit }).error);
            return;
        }

        let orphaned = {
            let mut registry = self.registry.lock();
            match registry.jobs.get_mut(job_id) {
                Some(job) if !job.status.is_terminal() => {
                    job.status = JobStatus::Completed;
                    job.progress = 100;
                    job.file = Some(path.clone());
                    false
                }
                _ => true,
            }
        };

        if orphaned {
            // Session was cleaned up while the engine was finishing
            super::sessions::remove_files(vec![path]).await;
        } else {
            tracing::info!(download_id = %job_id, size, "download completed");
        }
    }

    fn fail_job(&self, job_id: &JobId, message: String) {
        let mut registry = self.registry.lock();
        if let Some(job) = registry.jobs.get_mut(job_id) {
            if !job.status.is_terminal() {
                job.status = JobStatus::Failed;
                job.error = Some(message);
            }
        }
    }

    /// Status of a job, refreshing its session's inactivity clock
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] for unknown (or cleaned up) jobs
    /// - [`Error::DownloadFailed`] once the job has failed
    pub fn status(&self, job_id: &str) -> Result<StatusResponse> {
        let mut registry = self.registry.lock();
        let job_id = JobId::from(job_id);
        let (status, progress, error, session_id) = match registry.jobs.get(&job_id) {
            Some(job) => (
                job.status,
                job.progress,
                job.error.clone(),
                job.session_id.clone(),
            ),
            None => return Err(Error::NotFound(DOWNLOAD_NOT_FOUND.to_string())),
        };
        if let Some(session) = registry.sessions.get_mut(&session_id) {
            session.last_access = Instant::now();
        }

        if status == JobStatus::Failed {
            return Err(Error::DownloadFailed(
                error.unwrap_or_else(|| DOWNLOAD_FAILED.to_string()),
            ));
        }
        Ok(StatusResponse { status, progress })
    }

    /// Path of a completed job's file
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] unless the job completed and its file still exists.
    pub async fn file(&self, job_id: &str) -> Result<PathBuf> {
        let path = {
            let registry = self.registry.lock();
            registry
                .jobs
                .get(&JobId::from(job_id))
                .filter(|job| job.status == JobStatus::Completed)
                .and_then(|job| job.file.clone())
        };

        match path {
            Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => Ok(path),
            _ => Err(Error::NotFound(FILE_NOT_FOUND.to_string())),
        }
    }
}

/// Message recorded for a failed job
fn failure_message(error: &Error) -> String {
    match error {
        Error::Engine(detail) if !detail.is_empty() => {
            format!("An error occurred during the download: {detail}")
        }
        Error::Engine(_) => DOWNLOAD_FAILED.to_string(),
        other => other.to_string(),
    }
}
