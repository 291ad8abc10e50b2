//! A real backend and API server on a random local port

use mediagrab::api::create_router;
use mediagrab::{ApiConfig, BackendConfig, ClientConfig, MediaBackend, MediaClient, MediaEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Running server; aborted on drop
pub struct TestServer {
    pub backend: MediaBackend,
    pub addr: SocketAddr,
    _temp_dir: TempDir,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a backend over `engine` and serve it on 127.0.0.1
    pub async fn start(engine: Arc<dyn MediaEngine>) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = BackendConfig {
            download_dir: temp_dir.path().join("downloads"),
            ..BackendConfig::default()
        };
        let backend = MediaBackend::new(config, engine)
            .await
            .expect("Failed to create backend");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener has no address");
        let app = create_router(backend.clone(), Arc::new(ApiConfig::default()));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            backend,
            addr,
            _temp_dir: temp_dir,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client config pointing at this server, polling every 100 ms
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url(),
            poll_interval: Duration::from_millis(100),
            stall_timeout: None,
            request_timeout: Some(Duration::from_secs(10)),
            ..ClientConfig::default()
        }
    }

    pub fn client(&self) -> MediaClient {
        MediaClient::new(&self.client_config()).expect("Failed to create client")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
