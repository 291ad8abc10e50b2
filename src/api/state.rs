//! Application state for the API server

use crate::MediaBackend;
use crate::config::ApiConfig;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; the backend is itself a bundle of `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Session and job registry behind the protocol routes
    pub backend: MediaBackend,

    /// Server configuration
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(backend: MediaBackend, config: Arc<ApiConfig>) -> Self {
        Self { backend, config }
    }
}
