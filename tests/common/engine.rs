//! Scripted media engine served by the test backend

use async_trait::async_trait;
use mediagrab::{
    Error, FetchRequest, Format, FormatKind, MediaEngine, MediaInfo, ProgressSink, Result,
};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::time::Duration;

/// How a fetch ends after reporting its steps
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Write a file of this many bytes
    File(usize),
    /// Fail with this engine message
    Fail(String),
    /// Wait until the job is cancelled
    Hang,
}

/// Engine that reports fixed progress steps with a delay between them
pub struct StepEngine {
    pub steps: Vec<f64>,
    pub step_delay: Duration,
    pub outcome: Mutex<Outcome>,
}

impl StepEngine {
    pub fn new(steps: Vec<f64>, step_delay: Duration, outcome: Outcome) -> Self {
        Self {
            steps,
            step_delay,
            outcome: Mutex::new(outcome),
        }
    }

    /// Three steps 150 ms apart, then a 2 KiB file
    pub fn quick() -> Self {
        Self::new(
            vec![20.0, 55.0, 90.0],
            Duration::from_millis(150),
            Outcome::File(2048),
        )
    }
}

#[async_trait]
impl MediaEngine for StepEngine {
    async fn extract(&self, _url: &str) -> Result<MediaInfo> {
        Ok(sample_info())
    }

    async fn fetch(&self, request: FetchRequest, progress: ProgressSink) -> Result<PathBuf> {
        for step in &self.steps {
            tokio::time::sleep(self.step_delay).await;
            progress.report(*step);
        }
        tokio::time::sleep(self.step_delay).await;

        let outcome = self.outcome.lock().clone();
        match outcome {
            Outcome::File(bytes) => {
                let extension = match request.format.kind {
                    FormatKind::Video => "mp4",
                    FormatKind::Audio => "mp3",
                };
                let path = request
                    .output_dir
                    .join(format!("{}.{}", request.job_id, extension));
                tokio::fs::write(&path, vec![7u8; bytes]).await?;
                Ok(path)
            }
            Outcome::Fail(message) => Err(Error::Engine(message)),
            Outcome::Hang => {
                request.cancel.cancelled().await;
                Err(Error::Engine("cancelled".to_string()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "step"
    }
}

/// One 1080p video format and one audio format
pub fn sample_info() -> MediaInfo {
    MediaInfo {
        title: "Integration Clip".to_string(),
        author: "Test Channel".to_string(),
        thumbnail: "https://img.example.com/clip.jpg".to_string(),
        duration_secs: 3_725,
        views: 1_234_567,
        formats: vec![
            Format {
                format_id: "137".to_string(),
                kind: FormatKind::Video,
                resolution_label: "1080p".to_string(),
                size_bytes: 10_485_760,
            },
            Format {
                format_id: "251".to_string(),
                kind: FormatKind::Audio,
                resolution_label: "160kbps".to_string(),
                size_bytes: 0,
            },
        ],
    }
}
