//! Auto-fallback decorator: a primary adapter backed by a secondary one.

use crate::traits::{StorageAdapter, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use claiss_core::{ListOptions, ListResult, UploadOptions, UploadResult};
use std::sync::Arc;

/// Tries `primary` first and, on any error, repeats the call against
/// `secondary`. Callers only ever see the secondary's error.
///
/// `upload` and `list` fall back independently; no availability state is
/// carried between calls.
pub struct AutoFallbackAdapter {
    primary: Arc<dyn StorageAdapter>,
    secondary: Arc<dyn StorageAdapter>,
}

impl AutoFallbackAdapter {
    pub fn new(primary: Arc<dyn StorageAdapter>, secondary: Arc<dyn StorageAdapter>) -> Self {
        tracing::info!(
            primary = %primary.provider_name(),
            secondary = %secondary.provider_name(),
            "Auto-fallback storage configured"
        );
        Self { primary, secondary }
    }
}

#[async_trait]
impl StorageAdapter for AutoFallbackAdapter {
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<UploadResult> {
        match self.primary.upload(path, data.clone(), options).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(
                    primary = %self.primary.provider_name(),
                    secondary = %self.secondary.provider_name(),
                    path = %path,
                    error = %e,
                    "Primary storage upload failed, falling back"
                );
                self.secondary.upload(path, data, options).await
            }
        }
    }

    async fn list(&self, options: &ListOptions) -> StorageResult<ListResult> {
        match self.primary.list(options).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(
                    primary = %self.primary.provider_name(),
                    secondary = %self.secondary.provider_name(),
                    error = %e,
                    "Primary storage list failed, falling back"
                );
                self.secondary.list(options).await
            }
        }
    }

    /// Always the primary's URL, even while the primary is failing.
    fn public_url(&self, video_id: &str) -> String {
        self.primary.public_url(video_id)
    }

    fn provider_name(&self) -> String {
        format!(
            "auto ({} -> {})",
            self.primary.provider_name(),
            self.secondary.provider_name()
        )
    }
}
