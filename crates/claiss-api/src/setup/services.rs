//! Service construction from configuration

use crate::state::AppState;
use anyhow::{Context, Result};
use claiss_core::Config;
use claiss_processing::{LocalRenderer, RemoteComputeClient};
use claiss_storage::StorageSelector;
use std::sync::Arc;

pub fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let storage = Arc::new(StorageSelector::new(config.storage.clone()));

    let compute = RemoteComputeClient::new(&config.compute)
        .context("Failed to build remote compute client")?;
    if config.compute.remote_enabled && !compute.is_configured() {
        tracing::warn!(
            "Remote compilation enabled but REMOTE_COMPUTE_URL is not set, requests will fail over to local rendering"
        );
    }

    let renderer = LocalRenderer::from_config(&config.compute);

    tracing::info!(
        storage_provider = %config.storage.provider,
        blob_configured = config.storage.has_blob_credentials(),
        s3_configured = config.storage.has_s3_credentials(),
        remote_enabled = config.compute.remote_enabled,
        fallback_to_local = config.compute.fallback_to_local,
        renderer = %config.compute.renderer_path,
        local_fallback_path = %config.compute.local_fallback_path.display(),
        "Services initialized"
    );

    Ok(Arc::new(AppState::new(
        config.clone(),
        storage,
        Arc::new(compute),
        Arc::new(renderer),
    )))
}
