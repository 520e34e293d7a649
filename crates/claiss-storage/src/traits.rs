//! Storage abstraction trait
//!
//! This module defines the contract every storage backend implements, and the
//! auto-fallback decorator composes.

use async_trait::async_trait;
use bytes::Bytes;
use claiss_core::{AppError, ListOptions, ListResult, UploadOptions, UploadResult};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Missing credentials or bucket. Raised at construction and never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A network call against the provider failed.
    #[error("{provider} request failed: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether another attempt could succeed. Configuration and key errors
    /// fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Provider { .. } | StorageError::Io(_))
    }

    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        StorageError::Provider {
            provider,
            message: message.into(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Configuration(msg) => AppError::Configuration(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage adapter trait
///
/// Objects live in a flat namespace addressed by logical path, conventionally
/// `videos/<id>.mp4`. Implementations are stateless apart from configuration,
/// so one instance can be shared by every request in the process.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Write `data` under `path` and report where it landed.
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<UploadResult>;

    /// Objects whose path starts with `options.prefix`, capped at `options.limit`.
    ///
    /// Listing order is provider-defined; sort by `uploaded_at` when recency
    /// matters (see [`ListResult::latest`]).
    async fn list(&self, options: &ListOptions) -> StorageResult<ListResult>;

    /// Retrievable URL for a video, synthesized without any network call.
    fn public_url(&self, video_id: &str) -> String;

    /// Fixed identifier used in diagnostics.
    fn provider_name(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_provider_and_io_errors_are_retryable() {
        assert!(StorageError::provider("s3", "503 Slow Down").is_retryable());
        assert!(StorageError::Io(std::io::Error::other("reset")).is_retryable());
        assert!(!StorageError::Configuration("no bucket".to_string()).is_retryable());
        assert!(!StorageError::InvalidKey("videos/".to_string()).is_retryable());
    }
}
