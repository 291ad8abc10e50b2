//! Expiry sweeps and shutdown

use super::MediaBackend;
use super::sessions::remove_files;
use crate::error::Result;
use crate::types::SessionId;
use std::sync::atomic::Ordering;
use std::time::{Duration, SystemTime};

/// How long shutdown waits for runners to observe cancellation
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl MediaBackend {
    /// Drop sessions idle for longer than `session_ttl`, with their jobs and files
    ///
    /// Returns the number of sessions removed.
    pub async fn sweep_expired_sessions(&self) -> usize {
        let ttl = self.config.session_ttl;
        let (expired, files) = {
            let mut registry = self.registry.lock();
            let expired: Vec<SessionId> = registry
                .sessions
                .iter()
                .filter(|(_, session)| session.last_access.elapsed() > ttl)
                .map(|(id, _)| id.clone())
                .collect();

            let mut files = Vec::new();
            for session_id in &expired {
                if let Some(session_files) = registry.detach_session(session_id) {
                    files.extend(session_files);
                }
            }
            (expired, files)
        };

        for session_id in &expired {
            tracing::info!(session_id = %session_id, "session expired");
        }
        remove_files(files).await;
        expired.len()
    }

    /// Delete files in the download directory older than `file_expiry`
    ///
    /// Returns the number of files removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the download directory cannot be read.
    pub async fn remove_expired_files(&self) -> Result<usize> {
        let max_age = self.config.file_expiry;
        let now = SystemTime::now();
        let mut removed = 0;

        let mut entries = tokio::fs::read_dir(&self.config.download_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "failed to stat file");
                    continue;
                }
            };

            let expired = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > max_age);
            if !expired {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    tracing::debug!(path = %entry.path().display(), "removed expired file");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "failed to remove expired file")
                }
            }
        }

        Ok(removed)
    }

    /// Spawn the periodic expiry sweep; it stops when the backend shuts down
    pub fn start_maintenance(&self) -> tokio::task::JoinHandle<()> {
        let backend = self.clone();
        let shutdown = self.shutdown_token.clone();
        let period = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let sessions = backend.sweep_expired_sessions().await;
                        if sessions > 0 {
                            tracing::info!(sessions, "expired idle sessions");
                        }
                        match backend.remove_expired_files().await {
                            Ok(0) => {}
                            Ok(files) => tracing::info!(files, "removed expired files"),
                            Err(e) => tracing::warn!(error = %e, "expired file sweep failed"),
                        }
                    }
                    _ = shutdown.cancelled() => {
                        tracing::debug!("maintenance task stopped");
                        break;
                    }
                }
            }
        })
    }

    /// Gracefully shut down the backend
    ///
    /// 1. Stops accepting new extractions and downloads
    /// 2. Cancels every running job and the maintenance task
    /// 3. Waits (up to 30 seconds) for runners to finish
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        self.shutdown_token.cancel();
        tracing::info!("Stopped accepting new work and cancelled running jobs");

        let wait = async {
            while self.active_jobs.load(Ordering::SeqCst) > 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait).await.is_err() {
            tracing::warn!(
                active_jobs = self.active_jobs.load(Ordering::SeqCst),
                "Timeout waiting for jobs to stop, proceeding with shutdown"
            );
        }

        tracing::info!("Graceful shutdown complete");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shutting_down(&self) -> bool {
        !self.accepting_new.load(Ordering::SeqCst)
    }
}
