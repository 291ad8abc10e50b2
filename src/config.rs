//! Configuration types for mediagrab

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Client-side protocol settings
///
/// Used by [`MediaClient`](crate::client::MediaClient) and
/// [`HttpMediaApi`](crate::client::HttpMediaApi).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend (default: "http://127.0.0.1:5000")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Interval between status polls of the active job (default: 1 second)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// Time without progress after which a `Stalled` event is emitted (default: 120 seconds)
    ///
    /// Polling continues after a stall; `None` disables the check.
    #[serde(default = "default_stall_timeout", with = "optional_duration_serde")]
    pub stall_timeout: Option<Duration>,

    /// Per-request timeout (default: none, a hung request never resolves)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval: default_poll_interval(),
            stall_timeout: default_stall_timeout(),
            request_timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Backend collaborator settings (storage, limits, expiry)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Directory produced files are written to (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Largest file the backend will hand out, in bytes (default: 50 MiB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Age after which files in the download directory are deleted (default: 24 hours)
    #[serde(default = "default_file_expiry", with = "duration_serde")]
    pub file_expiry: Duration,

    /// Inactivity after which a session and its jobs are dropped (default: 1 hour)
    #[serde(default = "default_session_ttl", with = "duration_serde")]
    pub session_ttl: Duration,

    /// Interval of the expiry sweep (default: 60 seconds)
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    pub sweep_interval: Duration,

    /// Public origin used to build absolute download links (e.g. "https://media.example.com")
    ///
    /// When unset, links are relative (`/download/{id}`).
    #[serde(default)]
    pub public_base_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_file_size: default_max_file_size(),
            file_expiry: default_file_expiry(),
            session_ttl: default_session_ttl(),
            sweep_interval: default_sweep_interval(),
            public_base_url: None,
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:5000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Main configuration
///
/// Every field has a serde default, so an empty JSON object is a valid config.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Client-side protocol settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Backend storage and expiry settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_stall_timeout() -> Option<Duration> {
    Some(Duration::from_secs(120))
}

fn default_user_agent() -> String {
    format!("mediagrab/{}", env!("CARGO_PKG_VERSION"))
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024
}

fn default_file_expiry() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_session_ttl() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
