//! Shared application state handed to every handler.

use claiss_core::Config;
use claiss_processing::{
    CompilationOrchestrator, CompilationSettings, ComputeService, MergeOrchestrator, Renderer,
    VideoPersister,
};
use claiss_storage::{LocalDiskTier, StorageSelector};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    /// Adapter slot shared by compilation, merge and retrieval.
    pub storage: Arc<StorageSelector>,
    /// Last-resort file written when every provider fails.
    pub disk: LocalDiskTier,
    pub compilation: CompilationOrchestrator,
    pub merge: MergeOrchestrator,
    /// A remote compute base URL is configured.
    pub remote_compute_configured: bool,
}

impl AppState {
    /// Wire the orchestrators around the given compute and storage seams.
    pub fn new(
        config: Config,
        storage: Arc<StorageSelector>,
        compute: Arc<dyn ComputeService>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let disk = LocalDiskTier::new(config.compute.local_fallback_path.clone());
        let persister = VideoPersister::new(storage.clone(), disk.clone());

        let compilation = CompilationOrchestrator::new(
            compute.clone(),
            renderer,
            persister,
            CompilationSettings::from(&config.compute),
        );
        let merge = MergeOrchestrator::new(compute, storage.clone());
        let remote_compute_configured = config.compute.remote_url.is_some();

        Self {
            config,
            storage,
            disk,
            compilation,
            merge,
            remote_compute_configured,
        }
    }
}
