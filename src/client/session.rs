//! Session lifecycle: extraction and best-effort cleanup

use super::api::MediaApi;
use crate::error::{Error, Operation, Result};
use crate::types::{Event, Session, SessionId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Message returned for an empty or whitespace-only URL
pub const EMPTY_URL_MESSAGE: &str = "Please enter a media URL.";

/// Trimmed URL, or a validation error when nothing is left
pub fn validate_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::Validation(EMPTY_URL_MESSAGE.to_string()));
    }
    Ok(url)
}

#[derive(Debug, Default)]
struct SessionSlot {
    generation: u64,
    session: Option<Session>,
    loading: bool,
}

/// Owns the client's single live session
///
/// Every `create` and `cleanup` bumps the generation; an extraction response
/// is applied only if the generation it was issued under is still current.
pub struct SessionController {
    api: Arc<dyn MediaApi>,
    events: broadcast::Sender<Event>,
    stall_timeout: Option<Duration>,
    slot: Mutex<SessionSlot>,
}

impl SessionController {
    /// Create a controller with no live session
    pub fn new(
        api: Arc<dyn MediaApi>,
        events: broadcast::Sender<Event>,
        stall_timeout: Option<Duration>,
    ) -> Self {
        Self {
            api,
            events,
            stall_timeout,
            slot: Mutex::new(SessionSlot::default()),
        }
    }

    /// Extract `url` into a new live session.
    ///
    /// Fails with [`Error::Validation`] before any request when the URL is
    /// blank. The previous session, if any, is released first. Returns
    /// [`Error::Superseded`] when another `create` or `cleanup` ran while the
    /// request was in flight; that response is dropped without events.
    pub async fn create(&self, url: &str) -> Result<Session> {
        let url = validate_url(url)?;

        let (generation, previous) = {
            let mut slot = self.slot.lock();
            slot.generation += 1;
            slot.loading = true;
            self.events
                .send(Event::Loading {
                    url: url.to_string(),
                })
                .ok();
            (slot.generation, slot.session.take())
        };
        if let Some(previous) = previous {
            self.spawn_cleanup(previous.id);
        }

        tracing::debug!(url, generation, "extracting media information");
        let result = self.extract_watching_stall(url, generation).await;

        let mut slot = self.slot.lock();
        if slot.generation != generation {
            tracing::debug!(
                generation,
                current = slot.generation,
                "discarding superseded extract response"
            );
            // The backend created a session nobody will use
            if let Ok(orphan) = result {
                self.spawn_cleanup(orphan.id);
            }
            return Err(Error::Superseded {
                operation: Operation::Extract,
            });
        }

        slot.loading = false;
        match result {
            Ok(session) => {
                tracing::info!(
                    session_id = %session.id,
                    formats = session.formats().len(),
                    "session ready"
                );
                slot.session = Some(session.clone());
                self.events
                    .send(Event::SessionReady {
                        session: session.clone(),
                    })
                    .ok();
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "extraction failed");
                self.events
                    .send(Event::Error {
                        job_id: None,
                        message: e.user_message(),
                    })
                    .ok();
                Err(e)
            }
        }
    }

    /// Await the extraction, emitting one `Stalled` event if it outlives the stall ceiling
    async fn extract_watching_stall(&self, url: &str, generation: u64) -> Result<Session> {
        let request = self.api.extract(url);
        tokio::pin!(request);

        let Some(limit) = self.stall_timeout else {
            return request.await;
        };

        tokio::select! {
            result = &mut request => return result,
            _ = tokio::time::sleep(limit) => {}
        }

        {
            let slot = self.slot.lock();
            if slot.generation == generation {
                tracing::warn!(url, idle_secs = limit.as_secs(), "extraction stalled");
                self.events
                    .send(Event::Stalled {
                        job_id: None,
                        idle_secs: limit.as_secs(),
                    })
                    .ok();
            }
        }

        request.await
    }

    /// Release the live session, if any.
    ///
    /// Synchronous and non-blocking: the cleanup request runs in the
    /// background and its failures are only logged. Any extraction in flight
    /// is invalidated.
    pub fn cleanup(&self) {
        let previous = {
            let mut slot = self.slot.lock();
            slot.generation += 1;
            slot.loading = false;
            slot.session.take()
        };
        if let Some(previous) = previous {
            self.spawn_cleanup(previous.id);
        }
    }

    /// Snapshot of the live session
    pub fn current(&self) -> Option<Session> {
        self.slot.lock().session.clone()
    }

    /// Whether an extraction is in flight
    pub fn is_loading(&self) -> bool {
        self.slot.lock().loading
    }

    fn spawn_cleanup(&self, session_id: SessionId) {
        let api = Arc::clone(&self.api);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match api.cleanup(&session_id).await {
                        Ok(()) => tracing::debug!(session_id = %session_id, "session released"),
                        Err(e) => tracing::warn!(
                            session_id = %session_id,
                            error = %e,
                            "session cleanup failed, leaving it to backend expiry"
                        ),
                    }
                });
            }
            Err(_) => tracing::warn!(
                session_id = %session_id,
                "no async runtime for session cleanup, leaving it to backend expiry"
            ),
        }
    }
}
