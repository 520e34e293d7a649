//! Compilation orchestration: remote compute first, local renderer as fallback.

use crate::compute::ComputeService;
use crate::error::ComputeError;
use crate::persist::{StorageTier, VideoPersister};
use crate::renderer::Renderer;
use bytes::Bytes;
use claiss_core::{CompilationResult, ComputeConfig, ComputeTier};
use claiss_storage::keys;
use std::sync::Arc;

/// Which compute tiers are enabled.
#[derive(Debug, Clone, Copy)]
pub struct CompilationSettings {
    pub remote_enabled: bool,
    pub fallback_to_local: bool,
}

impl From<&ComputeConfig> for CompilationSettings {
    fn from(config: &ComputeConfig) -> Self {
        Self {
            remote_enabled: config.remote_enabled,
            fallback_to_local: config.fallback_to_local,
        }
    }
}

/// Drives one compilation request to a single [`CompilationResult`].
///
/// Remote compute runs first when enabled. A remote failure moves on to the
/// local renderer only when local fallback is enabled; otherwise it is
/// reported as is. Whichever tier produced the bytes then persists them
/// through [`VideoPersister`]. A persistence failure is terminal and does not
/// trigger another compute attempt.
pub struct CompilationOrchestrator {
    compute: Arc<dyn ComputeService>,
    renderer: Arc<dyn Renderer>,
    persister: VideoPersister,
    settings: CompilationSettings,
}

impl CompilationOrchestrator {
    pub fn new(
        compute: Arc<dyn ComputeService>,
        renderer: Arc<dyn Renderer>,
        persister: VideoPersister,
        settings: CompilationSettings,
    ) -> Self {
        Self {
            compute,
            renderer,
            persister,
            settings,
        }
    }

    pub fn settings(&self) -> CompilationSettings {
        self.settings
    }

    pub async fn compile(&self, code: &str, class_name: &str) -> CompilationResult {
        tracing::info!(
            class_name = %class_name,
            remote_enabled = self.settings.remote_enabled,
            fallback_to_local = self.settings.fallback_to_local,
            "Starting compilation"
        );

        if self.settings.remote_enabled {
            match self.compute.compile(code, class_name).await {
                Ok(render) => {
                    return self
                        .persist(ComputeTier::Remote, render.video, render.logs, render.duration)
                        .await;
                }
                Err(e) => {
                    tracing::warn!(
                        class_name = %class_name,
                        error = %e,
                        fallback_to_local = self.settings.fallback_to_local,
                        "Remote compilation failed"
                    );
                    if !self.settings.fallback_to_local {
                        return remote_failure(e);
                    }
                }
            }
            tracing::info!(class_name = %class_name, "Falling back to local compilation");
        }

        match self.renderer.render(code, class_name).await {
            Ok(render) => {
                self.persist(
                    ComputeTier::Local,
                    render.video,
                    Some(render.logs),
                    Some(render.duration),
                )
                .await
            }
            Err(e) => CompilationResult::failed(ComputeTier::Local, e.to_string()).with_logs(e.logs()),
        }
    }

    async fn persist(
        &self,
        tier: ComputeTier,
        video: Bytes,
        logs: Option<String>,
        duration: Option<f64>,
    ) -> CompilationResult {
        let video_id = keys::generate_video_id();

        match self.persister.persist(&video_id, video).await {
            Ok(persisted) => {
                tracing::info!(
                    compilation_type = %tier,
                    video_id = %persisted.upload.video_id,
                    url = %persisted.upload.url,
                    local_disk = persisted.tier == StorageTier::LocalDisk,
                    "Compilation completed"
                );
                CompilationResult::succeeded(
                    tier,
                    persisted.upload.pathname,
                    persisted.upload.url,
                    persisted.upload.video_id,
                )
                .with_logs(logs)
                .with_duration(duration)
            }
            Err(e) => {
                tracing::error!(compilation_type = %tier, error = %e, "Compiled video could not be saved");
                CompilationResult::failed(tier, e.to_string())
                    .with_logs(logs)
                    .with_duration(duration)
            }
        }
    }
}

fn remote_failure(error: ComputeError) -> CompilationResult {
    let message = match error {
        ComputeError::Rejected { ref message, .. } => message.clone(),
        ref other => format!("Remote compilation failed: {}", other),
    };
    CompilationResult::failed(ComputeTier::Remote, message)
        .with_logs(error.logs())
        .with_duration(error.duration())
}
