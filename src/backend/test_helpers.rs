//! Shared test helpers for creating MediaBackend instances in tests.

use super::{FetchRequest, MediaBackend, MediaEngine, ProgressSink};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::protocol::StatusResponse;
use crate::types::{Format, FormatKind, JobStatus, MediaInfo};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::{TempDir, tempdir};

/// What the fake engine does when asked to fetch
#[derive(Debug, Clone)]
pub(crate) enum FetchPlan {
    /// Report each step, then write a file of `bytes` bytes
    Succeed { steps: Vec<f64>, bytes: usize },
    /// Report each step, then fail with the message
    Fail { steps: Vec<f64>, message: String },
    /// Report each step, then wait until cancelled
    Hang { steps: Vec<f64> },
}

/// `MediaEngine` with scripted behaviour and call counters
pub(crate) struct FakeEngine {
    pub info: Mutex<MediaInfo>,
    pub plan: Mutex<FetchPlan>,
    pub extract_error: Mutex<Option<String>>,
    pub extracts: AtomicUsize,
    pub fetches: AtomicUsize,
    pub cancelled: AtomicUsize,
}

impl FakeEngine {
    pub fn new(plan: FetchPlan) -> Arc<Self> {
        Arc::new(Self {
            info: Mutex::new(sample_info()),
            plan: Mutex::new(plan),
            extract_error: Mutex::new(None),
            extracts: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
        })
    }

    pub fn set_plan(&self, plan: FetchPlan) {
        *self.plan.lock() = plan;
    }

    pub fn fail_extract(&self, message: &str) {
        *self.extract_error.lock() = Some(message.to_string());
    }

    pub fn set_info(&self, info: MediaInfo) {
        *self.info.lock() = info;
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    fn accepts(&self, url: &str) -> bool {
        crate::utils::is_http_url(url) && !url.contains("invalid")
    }

    async fn extract(&self, _url: &str) -> Result<MediaInfo> {
        self.extracts.fetch_add(1, Ordering::SeqCst);
        let error = self.extract_error.lock().clone();
        match error {
            Some(message) => Err(Error::Engine(message)),
            None => Ok(self.info.lock().clone()),
        }
    }

    async fn fetch(&self, request: FetchRequest, progress: ProgressSink) -> Result<PathBuf> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let plan = self.plan.lock().clone();

        let steps = match &plan {
            FetchPlan::Succeed { steps, .. }
            | FetchPlan::Fail { steps, .. }
            | FetchPlan::Hang { steps } => steps.clone(),
        };
        for step in steps {
            progress.report(step);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        match plan {
            FetchPlan::Succeed { bytes, .. } => {
                let extension = match request.format.kind {
                    FormatKind::Video => "mp4",
                    FormatKind::Audio => "mp3",
                };
                let path = request
                    .output_dir
                    .join(format!("{}.{}", request.job_id, extension));
                tokio::fs::write(&path, vec![0u8; bytes]).await?;
                Ok(path)
            }
            FetchPlan::Fail { message, .. } => Err(Error::Engine(message)),
            FetchPlan::Hang { .. } => {
                request.cancel.cancelled().await;
                self.cancelled.fetch_add(1, Ordering::SeqCst);
                Err(Error::Engine("cancelled".to_string()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Two video formats followed by one audio format
pub(crate) fn sample_info() -> MediaInfo {
    MediaInfo {
        title: "Sample Clip".to_string(),
        author: "Someone".to_string(),
        thumbnail: "https://img.example.com/1.jpg".to_string(),
        duration_secs: 125,
        views: 1_000,
        formats: vec![
            Format {
                format_id: "22".to_string(),
                kind: FormatKind::Video,
                resolution_label: "720p".to_string(),
                size_bytes: 4096,
            },
            Format {
                format_id: "18".to_string(),
                kind: FormatKind::Video,
                resolution_label: "360p".to_string(),
                size_bytes: 0,
            },
            Format {
                format_id: "140".to_string(),
                kind: FormatKind::Audio,
                resolution_label: "128kbps".to_string(),
                size_bytes: 1024,
            },
        ],
    }
}

/// Backend config rooted in `dir`
pub(crate) fn test_config(dir: &TempDir) -> BackendConfig {
    BackendConfig {
        download_dir: dir.path().join("downloads"),
        max_file_size: 1024 * 1024,
        ..BackendConfig::default()
    }
}

/// Helper to create a test MediaBackend over a fake engine.
/// Returns the backend, the engine and the tempdir (which must be kept alive).
pub(crate) async fn create_test_backend(
    plan: FetchPlan,
) -> (MediaBackend, Arc<FakeEngine>, TempDir) {
    let temp_dir = tempdir().unwrap();
    let engine = FakeEngine::new(plan);
    let backend = MediaBackend::new(test_config(&temp_dir), engine.clone())
        .await
        .unwrap();
    (backend, engine, temp_dir)
}

/// A fetch plan that finishes quickly with a small file
pub(crate) fn quick_success() -> FetchPlan {
    FetchPlan::Succeed {
        steps: vec![25.0, 50.0, 75.0],
        bytes: 512,
    }
}

/// Poll a job until `done` accepts its status, failing after five seconds
pub(crate) async fn wait_for_job(
    backend: &MediaBackend,
    job_id: &str,
    done: impl Fn(&Result<StatusResponse>) -> bool,
) -> Result<StatusResponse> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let status = backend.status(job_id);
        if done(&status) {
            return status;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {job_id} did not reach the expected state, last: {status:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Whether a status result is terminal
pub(crate) fn is_settled(status: &Result<StatusResponse>) -> bool {
    !matches!(
        status,
        Ok(StatusResponse {
            status: JobStatus::Preparing | JobStatus::Downloading,
            ..
        })
    )
}
