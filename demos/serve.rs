//! Backend server example
//!
//! Serves the download protocol with an engine that fetches direct file
//! URLs (anything a plain HTTP GET returns), so the whole session and job
//! lifecycle can be tried without a real media extractor.
//!
//! Usage: cargo run --example serve
//!
//! Then, from another terminal:
//! - `curl -X POST localhost:5000/api/extract -H 'content-type: application/json' -d '{"url":"https://example.com/clip.mp4"}'`
//! - `curl -X POST localhost:5000/api/download -H 'content-type: application/json' -d '{"session_id":"…","format_id":"direct","format_type":"video"}'`
//! - `curl localhost:5000/api/status/<download_id>`
//! - or `cargo run --example fetch -- https://example.com/clip.mp4`

use async_trait::async_trait;
use mediagrab::{
    Config, Error, FetchRequest, Format, FormatKind, MediaBackend, MediaEngine, MediaInfo,
    ProgressSink, Result, run_with_shutdown,
};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Identifier of the single format a direct URL offers
const DIRECT_FORMAT: &str = "direct";

/// Engine treating every URL as one downloadable file
struct DirectEngine {
    http: reqwest::Client,
}

impl DirectEngine {
    fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mediagrab-demo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Engine(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl MediaEngine for DirectEngine {
    async fn extract(&self, url: &str) -> Result<MediaInfo> {
        let response = self
            .http
            .head(url)
            .send()
            .await
            .map_err(|e| Error::Engine(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Engine(format!("HTTP {}", response.status())));
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let size_bytes = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let kind = if content_type.starts_with("audio/") {
            FormatKind::Audio
        } else {
            FormatKind::Video
        };
        let title = url::Url::parse(url)
            .ok()
            .and_then(|u| {
                u.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| url.to_string());

        Ok(MediaInfo {
            title,
            author: response.url().host_str().unwrap_or_default().to_string(),
            thumbnail: String::new(),
            duration_secs: 0,
            views: 0,
            formats: vec![Format {
                format_id: DIRECT_FORMAT.to_string(),
                kind,
                resolution_label: content_type,
                size_bytes,
            }],
        })
    }

    async fn fetch(&self, request: FetchRequest, progress: ProgressSink) -> Result<PathBuf> {
        let mut response = self
            .http
            .get(&request.source_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Engine(e.to_string()))?;
        let total = response.content_length();

        let extension = std::path::Path::new(&request.source_url)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.len() <= 4)
            .unwrap_or("bin");
        let path = request
            .output_dir
            .join(format!("{}.{}", request.job_id, extension));
        let mut file = tokio::fs::File::create(&path).await?;

        let mut downloaded = 0u64;
        loop {
            let chunk = tokio::select! {
                chunk = response.chunk() => chunk.map_err(|e| Error::Engine(e.to_string()))?,
                _ = request.cancel.cancelled() => {
                    drop(file);
                    tokio::fs::remove_file(&path).await.ok();
                    return Err(Error::Engine("cancelled".to_string()));
                }
            };
            let Some(chunk) = chunk else { break };
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            progress.report_bytes(downloaded, total);
        }
        file.flush().await?;

        Ok(path)
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediagrab=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::default();
    let engine = Arc::new(DirectEngine::new()?);
    let backend = MediaBackend::new(config.backend, engine).await?;

    println!("Serving on http://{}", config.api.bind_address);
    println!("Press Ctrl+C to stop");

    run_with_shutdown(backend, config.api).await?;
    Ok(())
}
