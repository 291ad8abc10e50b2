//! Backend calls used by the controllers
//!
//! [`MediaApi`] is the seam between the controllers and the network; the
//! production implementation is [`HttpMediaApi`].

use crate::config::ClientConfig;
use crate::error::{Error, Operation, Result};
use crate::protocol::{
    CleanupRequest, DownloadRequest, DownloadResponse, ExtractRequest, ExtractResponse, Reply,
    StatusResponse,
};
use crate::types::{FormatKind, JobId, Session, SessionId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// The four backend calls of the download protocol
///
/// Implementations map an `{error}` body to [`Error::Remote`] and every
/// network or parse failure to [`Error::Transport`]. None of them retry.
#[async_trait]
pub trait MediaApi: Send + Sync {
    /// `POST /api/extract`
    async fn extract(&self, url: &str) -> Result<Session>;

    /// `POST /api/download`
    async fn start_download(
        &self,
        session_id: &SessionId,
        format_id: &str,
        kind: FormatKind,
    ) -> Result<DownloadResponse>;

    /// `GET /api/status/{download_id}`
    async fn status(&self, job_id: &JobId) -> Result<StatusResponse>;

    /// `POST /api/cleanup`; the response body is ignored
    async fn cleanup(&self, session_id: &SessionId) -> Result<()>;
}

/// [`MediaApi`] over HTTP with reqwest
#[derive(Clone, Debug)]
pub struct HttpMediaApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMediaApi {
    /// Build a client for `config.base_url`
    pub fn new(config: &ClientConfig) -> Result<Self> {
        url::Url::parse(&config.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", config.base_url, e),
            key: Some("base_url".to_string()),
        })?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| Error::Config {
            message: format!("failed to build HTTP client: {}", e),
            key: None,
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and parse the body whatever the HTTP status
    async fn send<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(operation, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(operation, e))?;

        match Reply::<T>::parse(&body) {
            Ok(Reply::Ok(value)) => Ok(value),
            Ok(Reply::Err(api_error)) => Err(Error::Remote {
                operation,
                message: api_error.error,
            }),
            Err(e) => Err(Error::transport(
                operation,
                format!("unexpected response (HTTP {}): {}", status, e),
            )),
        }
    }
}

#[async_trait]
impl MediaApi for HttpMediaApi {
    async fn extract(&self, url: &str) -> Result<Session> {
        let request = self
            .client
            .post(self.endpoint("/api/extract"))
            .json(&ExtractRequest {
                url: Some(url.to_string()),
            });
        let response: ExtractResponse = self.send(Operation::Extract, request).await?;
        Ok(response.video.into_session(url))
    }

    async fn start_download(
        &self,
        session_id: &SessionId,
        format_id: &str,
        kind: FormatKind,
    ) -> Result<DownloadResponse> {
        let request = self
            .client
            .post(self.endpoint("/api/download"))
            .json(&DownloadRequest {
                session_id: Some(session_id.to_string()),
                format_id: Some(format_id.to_string()),
                format_type: Some(kind),
            });
        self.send(Operation::StartDownload, request).await
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusResponse> {
        let path = format!("/api/status/{}", urlencoding::encode(job_id.as_str()));
        let request = self.client.get(self.endpoint(&path));
        self.send(Operation::PollStatus, request).await
    }

    async fn cleanup(&self, session_id: &SessionId) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("/api/cleanup"))
            .json(&CleanupRequest {
                session_id: Some(session_id.to_string()),
            })
            .send()
            .await
            .map_err(|e| Error::transport(Operation::Cleanup, e))?;

        if !response.status().is_success() {
            return Err(Error::transport(
                Operation::Cleanup,
                format!("HTTP {}", response.status()),
            ));
        }
        Ok(())
    }
}
