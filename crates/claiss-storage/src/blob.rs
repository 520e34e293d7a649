//! Managed blob service adapter (Vercel Blob REST API).
//!
//! Uploads are a single attempt: failures propagate immediately instead of
//! going through [`RetryPolicy`](crate::RetryPolicy). When this adapter is the
//! primary of an [`AutoFallbackAdapter`](crate::AutoFallbackAdapter), the S3
//! secondary absorbs the failure instead.

use crate::keys;
use crate::traits::{StorageAdapter, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use claiss_core::constants::DEFAULT_LIST_LIMIT;
use claiss_core::{BlobConfig, ListOptions, ListResult, StorageObject, UploadOptions, UploadResult};
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "vercel-blob";
const API_VERSION: &str = "7";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Deserialize)]
struct PutBlobResponse {
    url: String,
    pathname: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobEntry {
    url: String,
    pathname: String,
    size: u64,
    uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ListBlobResponse {
    blobs: Vec<BlobEntry>,
}

/// Vercel Blob storage implementation
#[derive(Clone)]
pub struct VercelBlobAdapter {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl VercelBlobAdapter {
    /// Create a new adapter.
    ///
    /// A missing token is not an error here: the platform may inject it later,
    /// so the check happens on each call.
    pub fn new(config: &BlobConfig) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn token(&self) -> StorageResult<&str> {
        self.token.as_deref().ok_or_else(|| {
            StorageError::Configuration("BLOB_READ_WRITE_TOKEN not configured".to_string())
        })
    }

    async fn check_status(response: reqwest::Response) -> StorageResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::provider(
            PROVIDER,
            format!("HTTP {}: {}", status, body),
        ))
    }
}

#[async_trait]
impl StorageAdapter for VercelBlobAdapter {
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<UploadResult> {
        let token = self.token()?;
        let size = data.len();
        let start = std::time::Instant::now();

        tracing::info!(provider = PROVIDER, path = %path, size_bytes = size, "Uploading blob");

        let blob: PutBlobResponse = async {
            let response = self
                .client
                .put(format!("{}/{}", self.api_url, path))
                .bearer_auth(token)
                .header("x-api-version", API_VERSION)
                .header("x-content-type", options.content_type.as_str())
                .header("x-vercel-blob-access", options.access.as_str())
                .header(
                    "x-add-random-suffix",
                    if options.add_random_suffix { "1" } else { "0" },
                )
                .body(data)
                .send()
                .await
                .map_err(|e| StorageError::provider(PROVIDER, e.to_string()))?;

            Self::check_status(response)
                .await?
                .json::<PutBlobResponse>()
                .await
                .map_err(|e| StorageError::provider(PROVIDER, e.to_string()))
        }
        .await
        .inspect_err(|e| {
            tracing::error!(
                provider = PROVIDER,
                path = %path,
                error = %e,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Blob upload failed"
            );
        })?;

        let video_id = keys::resolve_video_id(path);

        tracing::info!(
            provider = PROVIDER,
            url = %blob.url,
            video_id = %video_id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Blob upload successful"
        );

        Ok(UploadResult {
            url: blob.url,
            pathname: blob.pathname,
            video_id,
        })
    }

    async fn list(&self, options: &ListOptions) -> StorageResult<ListResult> {
        let token = self.token()?;
        let limit = options.limit.unwrap_or(DEFAULT_LIST_LIMIT);

        tracing::debug!(
            provider = PROVIDER,
            prefix = options.prefix.as_deref().unwrap_or("all"),
            limit,
            "Listing blobs"
        );

        let mut request = self
            .client
            .get(&self.api_url)
            .bearer_auth(token)
            .header("x-api-version", API_VERSION)
            .query(&[("limit", limit.to_string())]);
        if let Some(ref prefix) = options.prefix {
            request = request.query(&[("prefix", prefix.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::provider(PROVIDER, e.to_string()))?;
        let listing: ListBlobResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::provider(PROVIDER, e.to_string()))?;

        let blobs: Vec<StorageObject> = listing
            .blobs
            .into_iter()
            .map(|blob| StorageObject {
                url: blob.url,
                pathname: blob.pathname,
                size: blob.size,
                uploaded_at: blob.uploaded_at,
            })
            .collect();

        tracing::debug!(provider = PROVIDER, count = blobs.len(), "Blob listing complete");

        Ok(ListResult { blobs })
    }

    /// Blob URLs carry a store-specific host that is only known after a
    /// listing, so this points at the retrieval endpoint instead.
    fn public_url(&self, video_id: &str) -> String {
        keys::retrieval_url(video_id)
    }

    fn provider_name(&self) -> String {
        PROVIDER.to_string()
    }
}
