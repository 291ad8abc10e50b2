//! Folding controller events into what a view renders

use crate::types::{Event, Format, JobId, JobStatus, Session};

/// Screen state derived from the event stream
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing submitted
    #[default]
    Idle,

    /// Extraction in flight
    Loading {
        /// Submitted URL
        url: String,
        /// The extraction outlived the stall ceiling
        stalled: bool,
    },

    /// Formats can be picked
    Ready {
        /// Live session
        session: Session,
    },

    /// A job is being polled
    Downloading {
        /// Live session
        session: Option<Session>,
        /// Active job
        job_id: JobId,
        /// Last polled status
        status: JobStatus,
        /// Last polled progress
        percent: u8,
        /// Phase message to display
        phase: String,
        /// No progress for the stall ceiling
        stalled: bool,
    },

    /// The file is ready
    Complete {
        /// Live session
        session: Option<Session>,
        /// Completed job
        job_id: JobId,
        /// Link to the produced file
        download_url: String,
    },

    /// The last attempt failed
    Error {
        /// Session still live, if the failure happened after extraction
        session: Option<Session>,
        /// Message to display
        message: String,
    },
}

impl ViewState {
    /// Fold one event into the state.
    ///
    /// Events naming a job other than the one on screen are ignored.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::Loading { url } => {
                *self = ViewState::Loading {
                    url: url.clone(),
                    stalled: false,
                };
            }
            Event::SessionReady { session } => {
                *self = ViewState::Ready {
                    session: session.clone(),
                };
            }
            Event::JobStarted { job_id, .. } => {
                let status = JobStatus::Preparing;
                *self = ViewState::Downloading {
                    session: self.session().cloned(),
                    job_id: job_id.clone(),
                    status,
                    percent: 0,
                    phase: status.phase_message(0),
                    stalled: false,
                };
            }
            Event::Progress {
                job_id: id,
                status: new_status,
                percent: new_percent,
                phase: new_phase,
            } => {
                if let ViewState::Downloading {
                    job_id,
                    status,
                    percent,
                    phase,
                    stalled,
                    ..
                } = self
                {
                    if *job_id == *id {
                        let next = (*new_status, (*percent).max(*new_percent));
                        if next != (*status, *percent) {
                            *stalled = false;
                        }
                        (*status, *percent) = next;
                        *phase = new_phase.clone();
                    }
                }
            }
            Event::Completed {
                job_id,
                download_url,
            } => {
                if self.active_job() == Some(job_id) {
                    *self = ViewState::Complete {
                        session: self.session().cloned(),
                        job_id: job_id.clone(),
                        download_url: download_url.clone(),
                    };
                }
            }
            Event::Error { job_id, message } => {
                if job_id.is_some() && self.active_job() != job_id.as_ref() {
                    return;
                }
                *self = ViewState::Error {
                    session: self.session().cloned(),
                    message: message.clone(),
                };
            }
            Event::Stalled { job_id, .. } => match (self, job_id) {
                (ViewState::Loading { stalled, .. }, None) => *stalled = true,
                (
                    ViewState::Downloading {
                        job_id: active,
                        stalled,
                        ..
                    },
                    Some(id),
                ) if *active == *id => *stalled = true,
                _ => {}
            },
            Event::Reset => *self = ViewState::Idle,
        }
    }

    /// Live session shown by this state
    pub fn session(&self) -> Option<&Session> {
        match self {
            ViewState::Ready { session } => Some(session),
            ViewState::Downloading { session, .. }
            | ViewState::Complete { session, .. }
            | ViewState::Error { session, .. } => session.as_ref(),
            ViewState::Idle | ViewState::Loading { .. } => None,
        }
    }

    /// Job currently on screen
    pub fn active_job(&self) -> Option<&JobId> {
        match self {
            ViewState::Downloading { job_id, .. } | ViewState::Complete { job_id, .. } => {
                Some(job_id)
            }
            _ => None,
        }
    }

    /// Video and audio format lists for the picker
    pub fn format_lists(&self) -> Option<(Vec<&Format>, Vec<&Format>)> {
        self.session().map(|session| session.info.partition())
    }

    /// Whether a spinner should be shown
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading { .. })
    }
}
