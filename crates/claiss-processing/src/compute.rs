//! Remote compute service client
//!
//! The remote service renders scene code and concatenates rendered scenes.
//! Both calls are JSON over HTTP; rendered bytes come back base64-encoded.

use crate::error::ComputeError;
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use claiss_core::constants::REMOTE_QUALITY_TIER;
use claiss_core::{ComputeConfig, MergeOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bytes rendered by the remote service for one scene.
#[derive(Debug, Clone)]
pub struct RemoteRender {
    pub video: Bytes,
    pub logs: Option<String>,
    /// Seconds, as reported by the service.
    pub duration: Option<f64>,
}

/// Bytes of a merged video.
#[derive(Debug, Clone)]
pub struct RemoteMerge {
    pub video: Bytes,
    pub duration: Option<f64>,
}

/// Compute backend used by the orchestrators.
#[async_trait]
pub trait ComputeService: Send + Sync {
    async fn compile(&self, code: &str, class_name: &str) -> Result<RemoteRender, ComputeError>;

    /// Concatenate `video_urls` in order.
    async fn merge(
        &self,
        video_urls: &[String],
        options: &MergeOptions,
    ) -> Result<RemoteMerge, ComputeError>;
}

#[derive(Debug, Serialize)]
struct CompileRequest<'a> {
    code: &'a str,
    class_name: &'a str,
    quality: &'a str,
}

#[derive(Debug, Serialize)]
struct MergeRequest<'a> {
    video_urls: &'a [String],
    add_transitions: bool,
    transition_duration: f64,
}

#[derive(Debug, Deserialize)]
struct ComputeResponse {
    success: bool,
    #[serde(default)]
    video_bytes: Option<String>,
    #[serde(default)]
    logs: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

impl ComputeResponse {
    /// Decoded video bytes, or the failure the service reported.
    fn into_video(self, operation: &str) -> Result<(Bytes, Option<String>, Option<f64>), ComputeError> {
        if !self.success {
            return Err(ComputeError::Rejected {
                message: self
                    .error
                    .unwrap_or_else(|| format!("Remote {} failed", operation)),
                logs: self.logs,
                duration: self.duration,
            });
        }

        let encoded = self
            .video_bytes
            .ok_or_else(|| ComputeError::InvalidResponse("missing video_bytes".to_string()))?;
        let video = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| ComputeError::InvalidResponse(format!("video_bytes: {}", e)))?;

        Ok((Bytes::from(video), self.logs, self.duration))
    }
}

/// HTTP client for the remote compute service.
pub struct RemoteComputeClient {
    client: reqwest::Client,
    base_url: Option<String>,
    token: Option<String>,
}

impl RemoteComputeClient {
    pub fn new(config: &ComputeConfig) -> Result<Self, ComputeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.remote_timeout_secs))
            .build()
            .map_err(|e| ComputeError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config
                .remote_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            token: config.remote_token.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<ComputeResponse, ComputeError> {
        let base_url = self.base_url.as_ref().ok_or(ComputeError::NotConfigured)?;

        let mut request = self
            .client
            .post(format!("{}/{}", base_url, endpoint))
            .json(body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ComputeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ComputeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ComputeResponse>()
            .await
            .map_err(|e| ComputeError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ComputeService for RemoteComputeClient {
    async fn compile(&self, code: &str, class_name: &str) -> Result<RemoteRender, ComputeError> {
        let start = std::time::Instant::now();
        tracing::info!(class_name = %class_name, "Requesting remote compilation");

        let response = self
            .post(
                "compile",
                &CompileRequest {
                    code,
                    class_name,
                    quality: REMOTE_QUALITY_TIER,
                },
            )
            .await?;
        let (video, logs, duration) = response.into_video("compilation")?;

        tracing::info!(
            class_name = %class_name,
            size_bytes = video.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote compilation succeeded"
        );

        Ok(RemoteRender {
            video,
            logs,
            duration,
        })
    }

    async fn merge(
        &self,
        video_urls: &[String],
        options: &MergeOptions,
    ) -> Result<RemoteMerge, ComputeError> {
        let start = std::time::Instant::now();
        tracing::info!(scene_count = video_urls.len(), "Requesting remote merge");

        let response = self
            .post(
                "merge",
                &MergeRequest {
                    video_urls,
                    add_transitions: options.add_transitions,
                    transition_duration: options.transition_duration,
                },
            )
            .await?;
        let (video, _, duration) = response.into_video("merge")?;

        tracing::info!(
            scene_count = video_urls.len(),
            size_bytes = video.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote merge succeeded"
        );

        Ok(RemoteMerge { video, duration })
    }
}
