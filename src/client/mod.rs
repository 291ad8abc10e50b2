//! Client side of the download protocol
//!
//! [`MediaClient`] is the object a view talks to. It owns one
//! [`SessionController`] and one [`JobController`] and reports everything
//! that happens through a broadcast channel of [`Event`]s.
//!
//! ```no_run
//! use mediagrab::client::{MediaClient, ViewState};
//! use mediagrab::config::ClientConfig;
//! use mediagrab::FormatKind;
//!
//! # async fn run() -> mediagrab::Result<()> {
//! let client = MediaClient::new(&ClientConfig::default())?;
//! let mut events = client.subscribe();
//! let mut view = ViewState::default();
//!
//! let session = client.submit("https://www.youtube.com/watch?v=abc").await?;
//! let audio = session.info.formats_of(FormatKind::Audio).next().cloned();
//! if let Some(format) = audio {
//!     client.pick(&format.format_id, format.kind).await?;
//! }
//!
//! while let Ok(event) = events.recv().await {
//!     view.apply(&event);
//!     if matches!(view, ViewState::Complete { .. } | ViewState::Error { .. }) {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod job;
mod session;
mod view;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use api::{HttpMediaApi, MediaApi};
pub use job::{JobController, PollSettings};
pub use session::{EMPTY_URL_MESSAGE, SessionController, validate_url};
pub use view::ViewState;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::types::{Event, FormatKind, Job, Session};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the event channel
const EVENT_CAPACITY: usize = 256;

/// Session and job controllers behind one view-facing API
pub struct MediaClient {
    sessions: SessionController,
    jobs: JobController,
    event_tx: broadcast::Sender<Event>,
}

impl MediaClient {
    /// Client talking HTTP to `config.base_url`
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let api = HttpMediaApi::new(config)?;
        Ok(Self::with_api(Arc::new(api), config))
    }

    /// Client over any [`MediaApi`] implementation
    pub fn with_api(api: Arc<dyn MediaApi>, config: &ClientConfig) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CAPACITY);
        let sessions = SessionController::new(
            Arc::clone(&api),
            event_tx.clone(),
            config.stall_timeout,
        );
        let jobs = JobController::new(
            api,
            event_tx.clone(),
            PollSettings {
                interval: config.poll_interval,
                stall_timeout: config.stall_timeout,
            },
        );
        Self {
            sessions,
            jobs,
            event_tx,
        }
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Submit a URL: validate, drop the current job and session, extract.
    ///
    /// A blank URL fails synchronously without touching existing state.
    pub async fn submit(&self, url: &str) -> Result<Session> {
        let url = validate_url(url)?;
        self.jobs.cancel();
        self.sessions.create(url).await
    }

    /// Start downloading a format of the live session
    pub async fn pick(&self, format_id: &str, kind: FormatKind) -> Result<Job> {
        let session = self.sessions.current();
        self.jobs
            .start(session.as_ref().map(|s| &s.id), format_id, kind)
            .await
    }

    /// Discard session and job state, releasing the session on the backend
    pub fn reset(&self) {
        self.jobs.cancel();
        self.sessions.cleanup();
        self.event_tx.send(Event::Reset).ok();
    }

    /// Page-exit teardown: stop polling and release the session without waiting
    pub fn unload(&self) {
        self.jobs.cancel();
        self.sessions.cleanup();
    }

    /// Live session, if any
    pub fn current_session(&self) -> Option<Session> {
        self.sessions.current()
    }

    /// Live job, if any
    pub fn current_job(&self) -> Option<Job> {
        self.jobs.current()
    }

    /// Whether an extraction is in flight
    pub fn is_loading(&self) -> bool {
        self.sessions.is_loading()
    }

    /// Whether a job is being polled
    pub fn is_polling(&self) -> bool {
        self.jobs.is_polling()
    }
}
