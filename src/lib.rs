//! # mediagrab
//!
//! Session and job lifecycle for inspecting a media URL, picking one of its
//! formats and following the download to completion through a backend
//! service.
//!
//! ## Design Philosophy
//!
//! mediagrab is designed to be:
//! - **Protocol-first** - Four HTTP calls (extract, start, status, cleanup) are the whole contract
//! - **Stale-proof** - Generation counters discard responses for sessions or jobs that were replaced
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Views subscribe to events and fold them into a [`ViewState`]
//!
//! Both halves live here: [`MediaClient`] drives the protocol, and
//! [`MediaBackend`] (served by [`api`]) honours it on top of a pluggable
//! [`MediaEngine`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use mediagrab::{Config, FormatKind, MediaClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = MediaClient::new(&config.client)?;
//!
//!     // Subscribe to events
//!     let mut events = client.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let session = client.submit("https://media.example.com/watch?v=1").await?;
//!     if let Some(format) = session.info.formats_of(FormatKind::Video).next() {
//!         client.pick(&format.format_id, format.kind).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Backend session and job registry
pub mod backend;
/// Protocol client, controllers and view state
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Wire types of the HTTP contract
pub mod protocol;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use backend::{BackendStats, FetchRequest, MediaBackend, MediaEngine, ProgressSink};
pub use client::{HttpMediaApi, JobController, MediaApi, MediaClient, SessionController, ViewState};
pub use config::{ApiConfig, BackendConfig, ClientConfig, Config};
pub use error::{ApiError, Error, Operation, Result, ToHttpStatus};
pub use types::{
    Event, Format, FormatKind, Job, JobId, JobStatus, MediaInfo, Session, SessionId,
};

/// Serve a backend until a termination signal, then shut it down gracefully.
///
/// Starts the backend's maintenance sweeps, serves the API on
/// `api.bind_address` and, once a signal arrives, stops the server and calls
/// [`MediaBackend::shutdown`].
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use mediagrab::{Config, MediaBackend, MediaEngine, run_with_shutdown};
/// use std::sync::Arc;
///
/// # async fn example(engine: Arc<dyn MediaEngine>) -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let backend = MediaBackend::new(config.backend, engine).await?;
///
/// run_with_shutdown(backend, config.api).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_with_shutdown(backend: MediaBackend, api: ApiConfig) -> Result<()> {
    let maintenance = backend.start_maintenance();

    let served = api::serve_with_shutdown(backend.clone(), api, wait_for_signal()).await;

    backend.shutdown().await;
    if let Err(e) = maintenance.await {
        tracing::warn!(error = %e, "maintenance task ended abnormally");
    }
    served
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
