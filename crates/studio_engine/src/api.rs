use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use studio_core::{
    encode_path_segment, FailureKind, HttpReply, OriginSlot, Payload, TransportError,
};
use studio_logging::{studio_debug, studio_info, studio_warn, ORIGIN_TARGET};
use thiserror::Error;
use url::Url;

use crate::OriginPool;

/// Header carrying the optional access key.
pub const ACCESS_KEY_HEADER: &str = "X-Tool-Studio-Key";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// `None` leaves the transport default in place.
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
    pub max_download_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            request_timeout: None,
            user_agent: format!("tool-studio/{}", env!("CARGO_PKG_VERSION")),
            max_download_bytes: 50 * 1024 * 1024,
        }
    }
}

/// The two calls the poll loop needs. Kept as a trait so the engine can be
/// driven without a network.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn submit(&self, tool: &str, payload: &Payload) -> Result<HttpReply, TransportError>;

    async fn job_status(&self, job_id: &str) -> Result<HttpReply, TransportError>;
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("artifact request failed (HTTP {0})")]
    HttpStatus(u16),
    #[error("artifact too large (max {max_bytes} bytes, got at least {actual})")]
    TooLarge { max_bytes: u64, actual: u64 },
}

#[derive(Debug, Clone)]
enum ApiRequest {
    Submit { tool: String, body: Vec<u8> },
    JobStatus { job_id: String },
    Artifact { job_id: String, artifact_id: String },
    Health,
}

impl ApiRequest {
    fn path(&self) -> String {
        match self {
            ApiRequest::Submit { tool, .. } => format!("/api/run/{}", encode_path_segment(tool)),
            ApiRequest::JobStatus { job_id } => format!("/api/jobs/{}", encode_path_segment(job_id)),
            ApiRequest::Artifact {
                job_id,
                artifact_id,
            } => studio_core::artifact_download_path(job_id, artifact_id),
            ApiRequest::Health => "/api/health".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestJobApi {
    client: reqwest::Client,
    origins: Arc<OriginPool>,
    access_key: Option<String>,
    settings: ClientSettings,
}

impl ReqwestJobApi {
    pub fn new(
        settings: ClientSettings,
        origins: Arc<OriginPool>,
        access_key: Option<String>,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(settings.user_agent.clone());
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            origins,
            access_key: access_key.filter(|key| !key.trim().is_empty()),
            settings,
        })
    }

    pub fn origins(&self) -> &Arc<OriginPool> {
        &self.origins
    }

    pub async fn health(&self) -> Result<HttpReply, TransportError> {
        let response = self.execute(&ApiRequest::Health).await?;
        read_reply(response).await
    }

    /// Fetches one artifact into memory, refusing bodies above the configured cap.
    pub async fn download_artifact(
        &self,
        job_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<u8>, DownloadError> {
        let request = ApiRequest::Artifact {
            job_id: job_id.to_string(),
            artifact_id: artifact_id.to_string(),
        };
        let response = self.execute(&request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }

        let max_bytes = self.settings.max_download_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(DownloadError::TooLarge {
                    max_bytes,
                    actual: content_len,
                });
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(DownloadError::TooLarge {
                    max_bytes,
                    actual: next_len,
                });
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    /// Sends `request` to the active origin. A connection-level failure while
    /// still on the primary is retried once against the backup, and a response
    /// from the backup moves the whole session over to it.
    async fn execute(&self, request: &ApiRequest) -> Result<reqwest::Response, TransportError> {
        let slot = self.origins.slot();
        let origin = self.origins.origin_for(slot);
        let err = match self.send_to(origin, request).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        let backup = match (slot, self.origins.backup()) {
            (OriginSlot::Primary, Some(backup)) if err.kind.is_connection_level() => backup,
            _ => return Err(err),
        };

        studio_warn!(
            target: ORIGIN_TARGET,
            "{} unreachable ({err}); retrying {} against {backup}",
            origin,
            request.path()
        );
        let response = self.send_to(backup, request).await?;
        if self.origins.commit_backup() {
            studio_info!(target: ORIGIN_TARGET, "switched to backup origin {backup} for this session");
        }
        Ok(response)
    }

    async fn send_to(
        &self,
        origin: &str,
        request: &ApiRequest,
    ) -> Result<reqwest::Response, TransportError> {
        let url = Url::parse(&format!("{origin}{}", request.path()))
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        studio_debug!(target: ORIGIN_TARGET, "{} {url}", request_method(request));

        let builder = match request {
            ApiRequest::Submit { body, .. } => self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone()),
            _ => self
                .client
                .get(url)
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache"),
        };
        let builder = match &self.access_key {
            Some(key) => builder.header(ACCESS_KEY_HEADER, key.as_str()),
            None => builder,
        };

        builder.send().await.map_err(map_reqwest_error)
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn submit(&self, tool: &str, payload: &Payload) -> Result<HttpReply, TransportError> {
        let body = serde_json::to_vec(payload)
            .map_err(|err| TransportError::new(FailureKind::InvalidBody, err.to_string()))?;
        let request = ApiRequest::Submit {
            tool: tool.to_string(),
            body,
        };
        let response = self.execute(&request).await?;
        read_reply(response).await
    }

    async fn job_status(&self, job_id: &str) -> Result<HttpReply, TransportError> {
        let request = ApiRequest::JobStatus {
            job_id: job_id.to_string(),
        };
        let response = self.execute(&request).await?;
        read_reply(response).await
    }
}

fn request_method(request: &ApiRequest) -> &'static str {
    match request {
        ApiRequest::Submit { .. } => "POST",
        _ => "GET",
    }
}

async fn read_reply(response: reqwest::Response) -> Result<HttpReply, TransportError> {
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    Ok(HttpReply::new(status, body.to_vec()))
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        return TransportError::new(FailureKind::InvalidUrl, err.to_string());
    }
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_connect() {
        return TransportError::new(FailureKind::Connect, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
