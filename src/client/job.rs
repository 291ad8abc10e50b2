//! Download job lifecycle and the status polling loop

use super::api::MediaApi;
use crate::error::{Error, Operation, Result};
use crate::protocol::StatusResponse;
use crate::types::{Event, FormatKind, Job, JobId, JobStatus, SessionId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Message shown when the backend reports `failed` without an error payload
const FAILED_MESSAGE: &str = "Download failed.";

/// Timing of the polling loop
#[derive(Clone, Copy, Debug)]
pub struct PollSettings {
    /// Interval between status requests
    pub interval: Duration,
    /// Emit `Stalled` after this long without progress
    pub stall_timeout: Option<Duration>,
}

#[derive(Debug, Default)]
struct JobSlot {
    generation: u64,
    job: Option<Job>,
    poller: Option<CancellationToken>,
}

impl JobSlot {
    /// Invalidate the current job and stop its poller
    fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        if let Some(token) = self.poller.take() {
            token.cancel();
        }
        self.job = None;
        self.generation
    }
}

/// What a poll tick decided
enum Tick {
    Continue,
    Stop,
}

/// Owns the client's single live job and its polling task
///
/// At most one poller runs at a time: `start` and `cancel` invalidate the
/// previous job's generation and cancel its token before anything else.
pub struct JobController {
    api: Arc<dyn MediaApi>,
    events: broadcast::Sender<Event>,
    settings: PollSettings,
    shared: Arc<Mutex<JobSlot>>,
}

impl JobController {
    /// Create a controller with no live job
    pub fn new(
        api: Arc<dyn MediaApi>,
        events: broadcast::Sender<Event>,
        settings: PollSettings,
    ) -> Self {
        Self {
            api,
            events,
            settings,
            shared: Arc::new(Mutex::new(JobSlot::default())),
        }
    }

    /// Start a download of `format_id` in `session_id` and begin polling it.
    ///
    /// Without a session this is a caller bug and fails with
    /// [`Error::InvalidState`] before any request. Any previous job is
    /// cancelled first. Remote and transport failures are terminal for the
    /// attempt: no polling starts.
    pub async fn start(
        &self,
        session_id: Option<&SessionId>,
        format_id: &str,
        kind: FormatKind,
    ) -> Result<Job> {
        let session_id = session_id
            .ok_or_else(|| Error::InvalidState("no live session to download from".to_string()))?
            .clone();

        let generation = self.shared.lock().invalidate();

        tracing::debug!(
            session_id = %session_id,
            format_id,
            kind = %kind,
            generation,
            "starting download"
        );
        let result = self.api.start_download(&session_id, format_id, kind).await;

        let mut slot = self.shared.lock();
        if slot.generation != generation {
            tracing::debug!(generation, "discarding superseded start response");
            return Err(Error::Superseded {
                operation: Operation::StartDownload,
            });
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(session_id = %session_id, format_id, error = %e, "download start failed");
                self.events
                    .send(Event::Error {
                        job_id: None,
                        message: e.user_message(),
                    })
                    .ok();
                return Err(e);
            }
        };

        let job = Job::started(
            JobId(response.download_id),
            session_id,
            format_id.to_string(),
            kind,
            response.download_url,
        );
        tracing::info!(job_id = %job.id, session_id = %job.session_id, "download started");

        let token = CancellationToken::new();
        slot.job = Some(job.clone());
        slot.poller = Some(token.clone());
        self.events
            .send(Event::JobStarted {
                job_id: job.id.clone(),
                session_id: job.session_id.clone(),
            })
            .ok();

        tokio::spawn(poll_loop(
            Arc::clone(&self.api),
            Arc::clone(&self.shared),
            self.events.clone(),
            self.settings,
            generation,
            job.id.clone(),
            token,
        ));

        Ok(job)
    }

    /// Stop polling and forget the live job; late responses are discarded
    pub fn cancel(&self) {
        let mut slot = self.shared.lock();
        if let Some(job) = &slot.job {
            tracing::debug!(job_id = %job.id, "cancelling job polling");
        }
        slot.invalidate();
    }

    /// Snapshot of the live job
    pub fn current(&self) -> Option<Job> {
        self.shared.lock().job.clone()
    }

    /// Whether a polling task is live
    pub fn is_polling(&self) -> bool {
        self.shared.lock().poller.is_some()
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        if let Some(token) = self.shared.lock().poller.take() {
            token.cancel();
        }
    }
}

/// Poll `job_id` every interval until a terminal state or cancellation.
///
/// Ticks are sequential: the next tick waits for the in-flight request.
async fn poll_loop(
    api: Arc<dyn MediaApi>,
    shared: Arc<Mutex<JobSlot>>,
    events: broadcast::Sender<Event>,
    settings: PollSettings,
    generation: u64,
    job_id: JobId,
    token: CancellationToken,
) {
    let mut ticker =
        tokio::time::interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stall = StallWatch::new(settings.stall_timeout);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let request = api.status(&job_id);
        tokio::pin!(request);
        let result = loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(job_id = %job_id, "poller cancelled with a request in flight");
                    return;
                }
                result = &mut request => break result,
                _ = stall.elapsed() => {
                    stall.report(&shared, &events, generation, &job_id);
                }
            }
        };

        let outcome = {
            let mut slot = shared.lock();
            if slot.generation != generation {
                tracing::debug!(job_id = %job_id, "discarding status response for a cancelled job");
                break;
            }
            apply_tick(&mut slot, &events, &mut stall, result)
        };
        if let Tick::Stop = outcome {
            break;
        }

        if stall.is_due() {
            stall.report(&shared, &events, generation, &job_id);
        }
    }

    tracing::debug!(job_id = %job_id, "poller stopped");
}

/// Apply one status result to the live job under the slot lock
fn apply_tick(
    slot: &mut JobSlot,
    events: &broadcast::Sender<Event>,
    stall: &mut StallWatch,
    result: Result<StatusResponse>,
) -> Tick {
    let Some(job) = slot.job.as_mut() else {
        return Tick::Stop;
    };

    let message = match result {
        Ok(StatusResponse {
            status: status @ (JobStatus::Preparing | JobStatus::Downloading),
            progress,
        }) => {
            let before = (job.status, job.progress_percent);
            if job.apply_status(status, progress) {
                if (job.status, job.progress_percent) != before {
                    stall.progressed();
                }
                events
                    .send(Event::Progress {
                        job_id: job.id.clone(),
                        status: job.status,
                        percent: job.progress_percent,
                        phase: job.status.phase_message(job.progress_percent),
                    })
                    .ok();
            }
            return Tick::Continue;
        }
        Ok(StatusResponse {
            status: JobStatus::Completed,
            ..
        }) => {
            job.apply_status(JobStatus::Completed, 100);
            tracing::info!(job_id = %job.id, "download completed");
            events
                .send(Event::Completed {
                    job_id: job.id.clone(),
                    download_url: job.download_url.clone(),
                })
                .ok();
            slot.poller = None;
            return Tick::Stop;
        }
        Ok(StatusResponse {
            status: JobStatus::Failed,
            ..
        }) => FAILED_MESSAGE.to_string(),
        Err(Error::Remote { message, .. }) => message,
        Err(e) => {
            tracing::warn!(job_id = %job.id, error = %e, "status poll failed, retrying on next tick");
            return Tick::Continue;
        }
    };

    tracing::warn!(job_id = %job.id, error = %message, "download failed");
    job.fail(message.clone());
    events
        .send(Event::Error {
            job_id: Some(job.id.clone()),
            message,
        })
        .ok();
    slot.poller = None;
    Tick::Stop
}

/// Tracks time since the last progress change and reports a stall once
struct StallWatch {
    limit: Option<Duration>,
    last_progress: Instant,
    reported: bool,
}

impl StallWatch {
    fn new(limit: Option<Duration>) -> Self {
        Self {
            limit,
            last_progress: Instant::now(),
            reported: false,
        }
    }

    fn progressed(&mut self) {
        self.last_progress = Instant::now();
        self.reported = false;
    }

    fn deadline(&self) -> Option<Instant> {
        match self.limit {
            Some(limit) if !self.reported => Some(self.last_progress + limit),
            _ => None,
        }
    }

    fn is_due(&self) -> bool {
        self.deadline().is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolves at the stall deadline, never if there is none
    async fn elapsed(&self) {
        match self.deadline() {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    fn report(
        &mut self,
        shared: &Mutex<JobSlot>,
        events: &broadcast::Sender<Event>,
        generation: u64,
        job_id: &JobId,
    ) {
        self.reported = true;
        let idle_secs = self.last_progress.elapsed().as_secs();
        let slot = shared.lock();
        if slot.generation != generation {
            return;
        }
        tracing::warn!(job_id = %job_id, idle_secs, "download stalled");
        events
            .send(Event::Stalled {
                job_id: Some(job_id.clone()),
                idle_secs,
            })
            .ok();
    }
}
