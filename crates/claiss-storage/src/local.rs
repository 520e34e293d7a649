use crate::traits::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Last-resort disk tier
///
/// A single file slot on ephemeral local disk, written when every storage
/// provider has failed. Each save replaces the previous video; readers never
/// observe a half-written file because writes go to a sibling temp file that
/// is renamed into place.
#[derive(Clone, Debug)]
pub struct LocalDiskTier {
    path: PathBuf,
}

/// An opened fallback video ready to stream.
pub struct LocalVideo {
    pub file: fs::File,
    pub size: u64,
}

impl LocalDiskTier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, data: &[u8]) -> StorageResult<()> {
        let start = std::time::Instant::now();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let partial = self
            .path
            .with_extension(format!("{}.partial", Uuid::new_v4().simple()));

        let write = async {
            let mut file = fs::File::create(&partial).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            fs::rename(&partial, &self.path).await
        };

        if let Err(e) = write.await {
            let _ = fs::remove_file(&partial).await;
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Local disk save failed"
            );
            return Err(StorageError::Io(e));
        }

        tracing::info!(
            path = %self.path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video saved to local disk"
        );

        Ok(())
    }

    /// Open the stored video, or `None` when nothing has been saved.
    pub async fn open(&self) -> StorageResult<Option<LocalVideo>> {
        let file = match fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let size = file.metadata().await?.len();
        Ok(Some(LocalVideo { file, size }))
    }
}
