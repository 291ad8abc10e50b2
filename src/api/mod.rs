//! REST API server module
//!
//! Serves the backend half of the download protocol over HTTP so that a
//! [`MediaClient`](crate::MediaClient), or any front-end speaking the same
//! contract, can drive a [`MediaBackend`].

use crate::config::ApiConfig;
use crate::{MediaBackend, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Protocol
/// - `POST /api/extract` - Inspect a media URL and open a session
/// - `POST /api/download` - Start producing one format of a session
/// - `GET /api/status/:download_id` - Poll a download job
/// - `POST /api/cleanup` - Release a session and its files
///
/// ## Files
/// - `GET /download/:download_id` - Fetch a completed file as an attachment
///
/// ## System
/// - `GET /health` - Health check with registry counters
/// - `GET /openapi.json` - OpenAPI specification
pub fn create_router(backend: MediaBackend, config: Arc<ApiConfig>) -> Router {
    let state = AppState::new(backend, config.clone());

    let router = Router::new()
        // Protocol
        .route("/api/extract", post(routes::extract))
        .route("/api/download", post(routes::start_download))
        .route("/api/status/:download_id", get(routes::download_status))
        .route("/api/cleanup", post(routes::cleanup))
        // Files
        .route("/download/:download_id", get(routes::download_file))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.cors_enabled {
        router.layer(build_cors_layer(&config.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` or an empty list allows any origin. Origins that are not valid
/// header values are skipped.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the server fails. Use [`serve_with_shutdown`] to stop it on a
/// signal.
///
/// # Example
///
/// ```no_run
/// use mediagrab::{Config, MediaBackend, MediaEngine};
/// use std::sync::Arc;
///
/// # async fn example(engine: Arc<dyn MediaEngine>) -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let backend = MediaBackend::new(config.backend, engine).await?;
///
/// mediagrab::api::start_api_server(backend, config.api).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(backend: MediaBackend, config: ApiConfig) -> Result<()> {
    serve_with_shutdown(backend, config, std::future::pending()).await
}

/// Serve the API until `shutdown` resolves, then stop accepting connections
/// and let in-flight requests finish.
pub async fn serve_with_shutdown<F>(
    backend: MediaBackend,
    config: ApiConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(backend, Arc::new(config));

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(bind_address),
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
