//! Session creation and teardown

use super::{MediaBackend, SessionEntry};
use crate::client::EMPTY_URL_MESSAGE;
use crate::error::{Error, Result};
use crate::types::{Session, SessionId};
use std::path::PathBuf;
use tokio::time::Instant;

/// Rejection for URLs the engine does not handle
pub(crate) const INVALID_URL_MESSAGE: &str =
    "The URL you entered is not valid. Please enter a valid media URL.";

/// Rejection for an extraction that found nothing to download
pub(crate) const NO_MEDIA_MESSAGE: &str =
    "No media information was found. Please check the URL and try again.";

/// Rejection for a cleanup call without a session id
pub(crate) const MISSING_SESSION_MESSAGE: &str = "Session ID is required.";

impl MediaBackend {
    /// Extract `url` and register a new session for it
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for a blank URL, one the engine does not accept,
    ///   or media without any format
    /// - [`Error::Engine`] when extraction fails
    /// - [`Error::ShuttingDown`] during shutdown
    pub async fn extract(&self, url: &str) -> Result<Session> {
        self.ensure_accepting()?;

        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Validation(EMPTY_URL_MESSAGE.to_string()));
        }
        if !self.engine.accepts(url) {
            tracing::debug!(url, engine = self.engine.name(), "url rejected by engine");
            return Err(Error::Validation(INVALID_URL_MESSAGE.to_string()));
        }

        let info = self.engine.extract(url).await.inspect_err(|e| {
            tracing::error!(url, error = %e, "failed to extract media information");
        })?;
        if info.formats.is_empty() {
            tracing::warn!(url, engine = self.engine.name(), "extraction returned no formats");
            return Err(Error::Validation(NO_MEDIA_MESSAGE.to_string()));
        }

        let session_id = SessionId::generate();
        self.registry.lock().sessions.insert(
            session_id.clone(),
            SessionEntry {
                url: url.to_string(),
                info: info.clone(),
                last_access: Instant::now(),
                jobs: Vec::new(),
            },
        );

        tracing::info!(
            session_id = %session_id,
            title = %info.title,
            formats = info.formats.len(),
            "session created"
        );

        Ok(Session {
            id: session_id,
            source_url: url.to_string(),
            info,
        })
    }

    /// Forget a session, cancelling its jobs and deleting their files
    ///
    /// Unknown sessions are ignored, so repeated calls succeed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `session_id` is blank.
    pub async fn cleanup(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(Error::Validation(MISSING_SESSION_MESSAGE.to_string()));
        }

        let session_id = SessionId::from(session_id);
        let files = self.registry.lock().detach_session(&session_id);
        match files {
            Some(files) => {
                tracing::info!(session_id = %session_id, files = files.len(), "session cleaned up");
                remove_files(files).await;
            }
            None => tracing::debug!(session_id = %session_id, "cleanup for unknown session"),
        }
        Ok(())
    }
}

/// Delete produced files, logging failures
pub(crate) async fn remove_files(files: Vec<PathBuf>) {
    for path in files {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "removed file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove file"),
        }
    }
}
