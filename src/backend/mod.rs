//! Backend side of the download protocol
//!
//! [`MediaBackend`] keeps the in-memory session and job registry, runs
//! downloads through a pluggable [`MediaEngine`] and expires abandoned
//! sessions and old files. The HTTP surface lives in [`crate::api`].

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::types::{JobId, JobStatus, MediaInfo, SessionId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

mod engine;
mod jobs;
mod maintenance;
mod sessions;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use engine::{FetchRequest, MediaEngine, ProgressSink};

/// One extracted URL and the jobs started from it
#[derive(Debug)]
pub(crate) struct SessionEntry {
    pub(crate) url: String,
    pub(crate) info: MediaInfo,
    /// Refreshed by every request naming the session
    pub(crate) last_access: Instant,
    pub(crate) jobs: Vec<JobId>,
}

/// One download job
#[derive(Debug)]
pub(crate) struct JobEntry {
    pub(crate) session_id: SessionId,
    pub(crate) status: JobStatus,
    pub(crate) progress: u8,
    pub(crate) file: Option<PathBuf>,
    pub(crate) error: Option<String>,
    pub(crate) cancel: CancellationToken,
}

/// Sessions and jobs, guarded by one lock so both maps stay consistent
#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub(crate) sessions: HashMap<SessionId, SessionEntry>,
    pub(crate) jobs: HashMap<JobId, JobEntry>,
}

impl Registry {
    /// Remove a session and its jobs, cancelling them.
    ///
    /// Returns the produced files so the caller can delete them without
    /// holding the lock.
    pub(crate) fn detach_session(&mut self, session_id: &SessionId) -> Option<Vec<PathBuf>> {
        let session = self.sessions.remove(session_id)?;
        let mut files = Vec::new();
        for job_id in session.jobs {
            if let Some(job) = self.jobs.remove(&job_id) {
                job.cancel.cancel();
                files.extend(job.file);
            }
        }
        Some(files)
    }
}

/// Counters reported by the health endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BackendStats {
    /// Live sessions
    pub sessions: usize,
    /// Jobs known to the registry
    pub jobs: usize,
    /// Jobs whose runner is still executing
    pub active_jobs: usize,
    /// Engine in use
    pub engine: String,
    /// When this backend was created
    pub started_at: DateTime<Utc>,
}

/// Backend instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MediaBackend {
    pub(crate) engine: Arc<dyn MediaEngine>,
    pub(crate) config: Arc<BackendConfig>,
    pub(crate) registry: Arc<Mutex<Registry>>,
    /// Number of runners still executing
    pub(crate) active_jobs: Arc<AtomicUsize>,
    /// Set to false during shutdown
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Parent of every job's cancellation token
    pub(crate) shutdown_token: CancellationToken,
    pub(crate) started_at: DateTime<Utc>,
}

impl MediaBackend {
    /// Create a backend, preparing the download directory
    ///
    /// Files older than `file_expiry` left over from a previous run are
    /// removed. Call [`start_maintenance`](Self::start_maintenance) to keep
    /// expiring sessions and files while running.
    pub async fn new(config: BackendConfig, engine: Arc<dyn MediaEngine>) -> Result<Self> {
        tokio::fs::create_dir_all(&config.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let backend = Self {
            engine,
            config: Arc::new(config),
            registry: Arc::new(Mutex::new(Registry::default())),
            active_jobs: Arc::new(AtomicUsize::new(0)),
            accepting_new: Arc::new(AtomicBool::new(true)),
            shutdown_token: CancellationToken::new(),
            started_at: Utc::now(),
        };

        match backend.remove_expired_files().await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "removed expired files at startup"),
            Err(e) => tracing::warn!(error = %e, "failed to remove expired files at startup"),
        }

        tracing::info!(
            engine = backend.engine.name(),
            download_dir = %backend.config.download_dir.display(),
            "media backend ready"
        );
        Ok(backend)
    }

    /// Backend configuration
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Current registry counters
    pub fn stats(&self) -> BackendStats {
        let registry = self.registry.lock();
        BackendStats {
            sessions: registry.sessions.len(),
            jobs: registry.jobs.len(),
            active_jobs: self.active_jobs.load(Ordering::SeqCst),
            engine: self.engine.name().to_string(),
            started_at: self.started_at,
        }
    }

    pub(crate) fn ensure_accepting(&self) -> Result<()> {
        if self.accepting_new.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::ShuttingDown)
        }
    }
}
