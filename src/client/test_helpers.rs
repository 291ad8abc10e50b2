//! Scripted `MediaApi` fake for controller tests.

use super::api::MediaApi;
use crate::config::ClientConfig;
use crate::error::{Error, Operation, Result};
use crate::protocol::{DownloadResponse, StatusResponse};
use crate::types::{Format, FormatKind, JobId, JobStatus, MediaInfo, Session, SessionId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One scripted reply, optionally delivered after a delay
pub(crate) struct Scripted<T> {
    pub delay: Duration,
    pub result: Result<T>,
}

impl<T> Scripted<T> {
    pub fn now(result: Result<T>) -> Self {
        Self {
            delay: Duration::ZERO,
            result,
        }
    }

    pub fn after(delay: Duration, result: Result<T>) -> Self {
        Self { delay, result }
    }
}

/// Calls observed by the fake, in order
#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub extract: Vec<String>,
    pub start: Vec<(SessionId, String, FormatKind)>,
    pub status: Vec<JobId>,
    pub status_at: Vec<Instant>,
    pub cleanup: Vec<SessionId>,
}

/// `MediaApi` answering from per-call queues; an empty queue is a transport error
#[derive(Default)]
pub(crate) struct ScriptedApi {
    extract: Mutex<VecDeque<Scripted<Session>>>,
    start: Mutex<VecDeque<Scripted<DownloadResponse>>>,
    status: Mutex<VecDeque<Scripted<StatusResponse>>>,
    cleanup_fails: Mutex<bool>,
    pub calls: Mutex<Calls>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_extract(&self, reply: Scripted<Session>) {
        self.extract.lock().push_back(reply);
    }

    pub fn push_start(&self, reply: Scripted<DownloadResponse>) {
        self.start.lock().push_back(reply);
    }

    pub fn push_status(&self, reply: Scripted<StatusResponse>) {
        self.status.lock().push_back(reply);
    }

    pub fn fail_cleanups(&self) {
        *self.cleanup_fails.lock() = true;
    }

    pub fn extract_calls(&self) -> usize {
        self.calls.lock().extract.len()
    }

    pub fn start_calls(&self) -> usize {
        self.calls.lock().start.len()
    }

    pub fn status_calls(&self) -> usize {
        self.calls.lock().status.len()
    }

    pub fn cleanups(&self) -> Vec<SessionId> {
        self.calls.lock().cleanup.clone()
    }

    pub fn total_calls(&self) -> usize {
        let calls = self.calls.lock();
        calls.extract.len() + calls.start.len() + calls.status.len() + calls.cleanup.len()
    }
}

async fn deliver<T>(
    queue: &Mutex<VecDeque<Scripted<T>>>,
    operation: Operation,
) -> Result<T> {
    let next = queue.lock().pop_front();
    match next {
        Some(Scripted { delay, result }) => {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        }
        None => Err(Error::transport(operation, "script exhausted")),
    }
}

#[async_trait]
impl MediaApi for ScriptedApi {
    async fn extract(&self, url: &str) -> Result<Session> {
        self.calls.lock().extract.push(url.to_string());
        deliver(&self.extract, Operation::Extract).await
    }

    async fn start_download(
        &self,
        session_id: &SessionId,
        format_id: &str,
        kind: FormatKind,
    ) -> Result<DownloadResponse> {
        self.calls
            .lock()
            .start
            .push((session_id.clone(), format_id.to_string(), kind));
        deliver(&self.start, Operation::StartDownload).await
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusResponse> {
        {
            let mut calls = self.calls.lock();
            calls.status.push(job_id.clone());
            calls.status_at.push(Instant::now());
        }
        deliver(&self.status, Operation::PollStatus).await
    }

    async fn cleanup(&self, session_id: &SessionId) -> Result<()> {
        self.calls.lock().cleanup.push(session_id.clone());
        if *self.cleanup_fails.lock() {
            return Err(Error::transport(Operation::Cleanup, "connection refused"));
        }
        Ok(())
    }
}

/// A session with `videos` video formats followed by `audios` audio formats
pub(crate) fn sample_session(id: &str, videos: usize, audios: usize) -> Session {
    let mut formats = Vec::new();
    for i in 0..videos {
        formats.push(Format {
            format_id: format!("v{i}"),
            kind: FormatKind::Video,
            resolution_label: format!("{}p", 360 * (i + 1)),
            size_bytes: 1024 * 1024 * (i as u64 + 1),
        });
    }
    for i in 0..audios {
        formats.push(Format {
            format_id: format!("a{i}"),
            kind: FormatKind::Audio,
            resolution_label: "128kbps".to_string(),
            size_bytes: 0,
        });
    }
    Session {
        id: SessionId::from(id),
        source_url: "https://valid/x".to_string(),
        info: MediaInfo {
            title: "Sample".to_string(),
            author: "Someone".to_string(),
            thumbnail: String::new(),
            duration_secs: 125,
            views: 1000,
            formats,
        },
    }
}

pub(crate) fn download(id: &str) -> DownloadResponse {
    DownloadResponse {
        success: true,
        download_id: id.to_string(),
        download_url: format!("/download/{id}"),
    }
}

pub(crate) fn status(status: JobStatus, progress: u8) -> StatusResponse {
    StatusResponse { status, progress }
}

pub(crate) fn remote(operation: Operation, message: &str) -> Error {
    Error::Remote {
        operation,
        message: message.to_string(),
    }
}

/// Client settings for tests: 1 s polling, stall detection off
pub(crate) fn test_config() -> ClientConfig {
    ClientConfig {
        stall_timeout: None,
        ..ClientConfig::default()
    }
}
