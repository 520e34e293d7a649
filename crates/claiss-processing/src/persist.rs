//! Persistence of compiled videos: storage provider first, local disk last.

use crate::error::PersistError;
use bytes::Bytes;
use claiss_core::{UploadOptions, UploadResult};
use claiss_storage::{keys, LocalDiskTier, StorageError, StorageSelector};
use std::sync::Arc;

/// Where a persisted video ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    Provider,
    LocalDisk,
}

#[derive(Debug, Clone)]
pub struct PersistedVideo {
    pub upload: UploadResult,
    pub tier: StorageTier,
}

pub struct VideoPersister {
    storage: Arc<StorageSelector>,
    disk: LocalDiskTier,
}

impl VideoPersister {
    pub fn new(storage: Arc<StorageSelector>, disk: LocalDiskTier) -> Self {
        Self { storage, disk }
    }

    pub fn disk(&self) -> &LocalDiskTier {
        &self.disk
    }

    /// Store `data` as `videos/<video_id>.mp4`.
    ///
    /// The provider upload is retried inside the adapter. If it still fails the
    /// bytes go to the local disk tier and the URL points at the retrieval
    /// endpoint. Only when both fail is an error returned.
    pub async fn persist(&self, video_id: &str, data: Bytes) -> Result<PersistedVideo, PersistError> {
        let path = keys::video_key(video_id);

        let storage_error = match self.upload(&path, data.clone()).await {
            Ok(upload) => {
                return Ok(PersistedVideo {
                    upload,
                    tier: StorageTier::Provider,
                })
            }
            Err(e) => e,
        };

        tracing::warn!(
            path = %path,
            error = %storage_error,
            fallback = %self.disk.path().display(),
            "Storage upload failed, saving to local disk"
        );

        match self.disk.save(&data).await {
            Ok(()) => Ok(PersistedVideo {
                upload: UploadResult {
                    url: keys::retrieval_url(video_id),
                    pathname: self.disk.path().display().to_string(),
                    video_id: video_id.to_string(),
                },
                tier: StorageTier::LocalDisk,
            }),
            Err(disk_error) => Err(PersistError::FallbackExhausted {
                storage: storage_error.to_string(),
                disk: disk_error.to_string(),
            }),
        }
    }

    async fn upload(&self, path: &str, data: Bytes) -> Result<UploadResult, StorageError> {
        let adapter = self.storage.adapter().await?;
        adapter
            .upload(path, data, &UploadOptions::public_video())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claiss_core::{BlobConfig, S3Config, StorageConfig, StorageProvider};
    use claiss_storage::test_helpers::MockAdapter;

    fn storage_config() -> StorageConfig {
        StorageConfig {
            provider: StorageProvider::Auto,
            blob: BlobConfig::default(),
            s3: S3Config::default(),
            retry_max_attempts: 1,
            retry_base_delay_ms: 1,
        }
    }

    fn persister(adapter: Arc<MockAdapter>, disk: LocalDiskTier) -> VideoPersister {
        VideoPersister::new(
            Arc::new(StorageSelector::with_adapter(storage_config(), adapter)),
            disk,
        )
    }

    #[tokio::test]
    async fn test_provider_upload_wins() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = Arc::new(MockAdapter::new("s3"));
        let persister = persister(adapter.clone(), LocalDiskTier::new(dir.path().join("latest.mp4")));

        let persisted = persister.persist("abc", Bytes::from_static(b"v")).await.unwrap();

        assert_eq!(persisted.tier, StorageTier::Provider);
        assert_eq!(persisted.upload.video_id, "abc");
        assert_eq!(persisted.upload.pathname, "videos/abc.mp4");
        assert!(persister.disk().open().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = Arc::new(MockAdapter::new("s3"));
        adapter.fail_with("bucket unreachable");
        let persister = persister(adapter, LocalDiskTier::new(dir.path().join("latest.mp4")));

        let persisted = persister.persist("abc", Bytes::from_static(b"video")).await.unwrap();

        assert_eq!(persisted.tier, StorageTier::LocalDisk);
        assert_eq!(persisted.upload.url, "/api/videos?id=abc");
        assert_eq!(std::fs::read(dir.path().join("latest.mp4")).unwrap(), b"video");
    }

    #[tokio::test]
    async fn test_both_tiers_failing_reports_both() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let adapter = Arc::new(MockAdapter::new("s3"));
        adapter.fail_with("bucket unreachable");
        let persister = persister(adapter, LocalDiskTier::new(blocker.join("latest.mp4")));

        let err = persister.persist("abc", Bytes::from_static(b"video")).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Failed to save video (Storage: "));
        assert!(message.contains("bucket unreachable"));
        assert!(message.contains("disk: "));
    }
}
