#[cfg(feature = "storage-blob")]
use crate::VercelBlobAdapter;
#[cfg(feature = "storage-s3")]
use crate::S3Adapter;
use crate::{AutoFallbackAdapter, RetryPolicy, StorageAdapter, StorageError, StorageResult};
use claiss_core::{StorageConfig, StorageProvider};
use std::sync::Arc;
use tokio::sync::RwLock;

#[cfg(feature = "storage-blob")]
fn blob_adapter(config: &StorageConfig) -> StorageResult<Arc<dyn StorageAdapter>> {
    Ok(Arc::new(VercelBlobAdapter::new(&config.blob)?))
}

#[cfg(not(feature = "storage-blob"))]
fn blob_adapter(_config: &StorageConfig) -> StorageResult<Arc<dyn StorageAdapter>> {
    Err(StorageError::Configuration(
        "Blob storage backend not available (storage-blob feature not enabled)".to_string(),
    ))
}

#[cfg(feature = "storage-s3")]
fn s3_adapter(config: &StorageConfig) -> StorageResult<Arc<dyn StorageAdapter>> {
    Ok(Arc::new(S3Adapter::new(
        &config.s3,
        RetryPolicy::from_config(config),
    )?))
}

#[cfg(not(feature = "storage-s3"))]
fn s3_adapter(_config: &StorageConfig) -> StorageResult<Arc<dyn StorageAdapter>> {
    Err(StorageError::Configuration(
        "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
    ))
}

/// Resolve the configured provider to one adapter.
///
/// `auto` picks by credential availability: both sets give blob backed by
/// S3, one set gives that provider alone, none gives the blob adapter (its
/// token may be injected later). A failing explicit provider gets exactly
/// one last-resort hop to the blob adapter.
pub fn build_adapter(config: &StorageConfig) -> StorageResult<Arc<dyn StorageAdapter>> {
    let built = match config.provider {
        StorageProvider::Auto => return build_auto(config),
        StorageProvider::VercelBlob => blob_adapter(config),
        StorageProvider::S3 => s3_adapter(config),
    };

    built.or_else(|e| {
        tracing::error!(
            provider = %config.provider,
            error = %e,
            "Storage adapter construction failed, using blob adapter as last resort"
        );
        blob_adapter(config)
    })
}

fn build_auto(config: &StorageConfig) -> StorageResult<Arc<dyn StorageAdapter>> {
    match (config.has_blob_credentials(), config.has_s3_credentials()) {
        (true, true) => Ok(with_secondary(blob_adapter(config)?, s3_adapter(config))),
        (false, true) => s3_adapter(config),
        (true, false) => blob_adapter(config),
        (false, false) => {
            tracing::warn!("No storage credentials configured, defaulting to blob adapter");
            blob_adapter(config)
        }
    }
}

/// Back `primary` with `secondary`, or keep `primary` alone when the
/// secondary could not be built.
fn with_secondary(
    primary: Arc<dyn StorageAdapter>,
    secondary: StorageResult<Arc<dyn StorageAdapter>>,
) -> Arc<dyn StorageAdapter> {
    match secondary {
        Ok(secondary) => Arc::new(AutoFallbackAdapter::new(primary, secondary)),
        Err(e) => {
            tracing::error!(
                primary = %primary.provider_name(),
                error = %e,
                "Fallback adapter construction failed, continuing without fallback"
            );
            primary
        }
    }
}

/// Holds the adapter shared by every request.
///
/// The adapter is built lazily on first use. Once published it stays the
/// same instance until [`StorageSelector::reset`]. Two callers racing on an
/// empty slot may both build an adapter; only the first one published is
/// ever handed out.
pub struct StorageSelector {
    config: StorageConfig,
    slot: RwLock<Option<Arc<dyn StorageAdapter>>>,
}

impl StorageSelector {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            slot: RwLock::new(None),
        }
    }

    /// Selector pre-populated with an adapter, bypassing configuration.
    pub fn with_adapter(config: StorageConfig, adapter: Arc<dyn StorageAdapter>) -> Self {
        Self {
            config,
            slot: RwLock::new(Some(adapter)),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub async fn adapter(&self) -> StorageResult<Arc<dyn StorageAdapter>> {
        if let Some(adapter) = self.slot.read().await.as_ref() {
            return Ok(adapter.clone());
        }

        let built = build_adapter(&self.config)?;

        let mut slot = self.slot.write().await;
        let adapter = slot.get_or_insert_with(|| {
            tracing::info!(provider = %built.provider_name(), "Storage adapter selected");
            built
        });
        Ok(adapter.clone())
    }

    /// Drop the cached adapter; the next call to [`adapter`](Self::adapter) rebuilds it.
    pub async fn reset(&self) {
        *self.slot.write().await = None;
    }
}
