//! Merging compiled scenes into one final video.

use crate::compute::ComputeService;
use crate::error::MergeError;
use claiss_core::{MergeOptions, Scene, UploadOptions, UploadResult};
use claiss_storage::{keys, StorageSelector};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Check that every scene is compiled and that orders form `0..n`.
///
/// Returns the video URLs sorted by scene order. Issues are collected rather
/// than failing on the first one.
pub fn validate_scenes(scenes: &[Scene]) -> Result<Vec<String>, MergeError> {
    let mut issues = Vec::new();

    let missing = scenes.iter().filter(|s| !s.has_compiled_video()).count();
    if missing > 0 {
        issues.push(format!("{} scene(s) missing compiled videos", missing));
    }

    let mut orders: Vec<i64> = scenes.iter().map(|s| s.order).collect();
    orders.sort_unstable();
    if !orders.iter().copied().eq(0..scenes.len() as i64) {
        issues.push("Scene order has gaps or duplicates".to_string());
    }

    if !issues.is_empty() {
        return Err(MergeError::Validation(issues));
    }
    if scenes.is_empty() {
        return Err(MergeError::validation("No compiled scenes to merge"));
    }

    let mut ordered: Vec<&Scene> = scenes.iter().collect();
    ordered.sort_by_key(|s| s.order);
    Ok(ordered
        .into_iter()
        .filter_map(|s| s.video_url.clone())
        .collect())
}

#[derive(Debug, Clone)]
pub struct MergeRequest {
    /// Id for the merged video; `final-<epoch ms>` when absent.
    pub video_id: Option<String>,
    pub scenes: Vec<Scene>,
    pub options: MergeOptions,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub upload: UploadResult,
    /// Merge time reported by the compute service, in seconds.
    pub merge_time: Option<f64>,
    pub scene_count: usize,
    pub elapsed: Duration,
}

/// Validates scenes, merges them remotely and uploads the result.
///
/// The merged video goes through the selected storage adapter only; there is
/// no local disk tier for merges.
pub struct MergeOrchestrator {
    compute: Arc<dyn ComputeService>,
    storage: Arc<StorageSelector>,
}

impl MergeOrchestrator {
    pub fn new(compute: Arc<dyn ComputeService>, storage: Arc<StorageSelector>) -> Self {
        Self { compute, storage }
    }

    pub async fn merge(&self, request: MergeRequest) -> Result<MergeOutcome, MergeError> {
        let start = Instant::now();

        let video_urls = validate_scenes(&request.scenes).inspect_err(|e| {
            tracing::warn!(scene_count = request.scenes.len(), error = %e, "Scene validation failed");
        })?;

        let requested_id = request.video_id.filter(|id| !id.trim().is_empty());
        if let Some(ref id) = requested_id {
            if !keys::is_safe_video_id(id) {
                tracing::warn!(video_id = %id, "Rejected merge video id");
                return Err(MergeError::InvalidVideoId(id.clone()));
            }
        }

        tracing::info!(
            scene_count = video_urls.len(),
            add_transitions = request.options.add_transitions,
            transition_duration = request.options.transition_duration,
            "Merging scenes"
        );

        let merged = self.compute.merge(&video_urls, &request.options).await?;

        let video_id = requested_id
            .unwrap_or_else(|| format!("final-{}", chrono::Utc::now().timestamp_millis()));

        let adapter = self.storage.adapter().await?;
        let upload = adapter
            .upload(
                &keys::video_key(&video_id),
                merged.video,
                &UploadOptions::public_video().with_random_suffix(),
            )
            .await?;

        let elapsed = start.elapsed();
        tracing::info!(
            video_id = %upload.video_id,
            url = %upload.url,
            scene_count = video_urls.len(),
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "Merge completed"
        );

        Ok(MergeOutcome {
            upload,
            merge_time: merged.duration,
            scene_count: video_urls.len(),
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{RemoteMerge, RemoteRender};
    use crate::error::ComputeError;
    use async_trait::async_trait;
    use bytes::Bytes;
    use claiss_core::{BlobConfig, S3Config, SceneStatus, StorageConfig, StorageProvider};
    use claiss_storage::test_helpers::MockAdapter;
    use std::sync::Mutex;

    fn scene(order: i64, status: SceneStatus, url: Option<&str>) -> Scene {
        Scene {
            id: None,
            order,
            status,
            video_url: url.map(String::from),
        }
    }

    fn compiled(order: i64, url: &str) -> Scene {
        scene(order, SceneStatus::Compiled, Some(url))
    }

    fn issues(result: Result<Vec<String>, MergeError>) -> Vec<String> {
        match result {
            Err(MergeError::Validation(issues)) => issues,
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_scenes_yield_urls_in_order() {
        let urls = validate_scenes(&[compiled(0, "a"), compiled(1, "b")]).unwrap();
        assert_eq!(urls, vec!["a", "b"]);

        let urls = validate_scenes(&[compiled(2, "c"), compiled(0, "a"), compiled(1, "b")]).unwrap();
        assert_eq!(urls, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_orders_rejected() {
        let found = issues(validate_scenes(&[compiled(0, "a"), compiled(0, "b")]));
        assert_eq!(found, vec!["Scene order has gaps or duplicates"]);
    }

    #[test]
    fn test_gap_in_orders_rejected() {
        let found = issues(validate_scenes(&[compiled(0, "a"), compiled(2, "b")]));
        assert_eq!(found, vec!["Scene order has gaps or duplicates"]);
    }

    #[test]
    fn test_uncompiled_scene_counts_as_missing_even_with_url() {
        let found = issues(validate_scenes(&[
            compiled(0, "a"),
            scene(1, SceneStatus::Pending, Some("b")),
            scene(2, SceneStatus::Compiled, Some("  ")),
        ]));
        assert_eq!(found, vec!["2 scene(s) missing compiled videos"]);
    }

    #[test]
    fn test_issues_are_itemized() {
        let found = issues(validate_scenes(&[
            scene(0, SceneStatus::Failed, None),
            compiled(0, "b"),
        ]));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_empty_scene_list_rejected() {
        let found = issues(validate_scenes(&[]));
        assert_eq!(found, vec!["No compiled scenes to merge"]);
    }

    struct RecordingCompute {
        urls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ComputeService for RecordingCompute {
        async fn compile(&self, _: &str, _: &str) -> Result<RemoteRender, ComputeError> {
            Err(ComputeError::NotConfigured)
        }

        async fn merge(
            &self,
            video_urls: &[String],
            _options: &MergeOptions,
        ) -> Result<RemoteMerge, ComputeError> {
            *self.urls.lock().unwrap() = video_urls.to_vec();
            if self.fail {
                return Err(ComputeError::Request("merge service down".to_string()));
            }
            Ok(RemoteMerge {
                video: Bytes::from_static(b"merged"),
                duration: Some(6.5),
            })
        }
    }

    fn orchestrator(fail: bool) -> (Arc<RecordingCompute>, Arc<MockAdapter>, MergeOrchestrator) {
        let compute = Arc::new(RecordingCompute {
            urls: Mutex::new(Vec::new()),
            fail,
        });
        let adapter = Arc::new(MockAdapter::new("s3"));
        let config = StorageConfig {
            provider: StorageProvider::Auto,
            blob: BlobConfig::default(),
            s3: S3Config::default(),
            retry_max_attempts: 1,
            retry_base_delay_ms: 1,
        };
        let storage = Arc::new(StorageSelector::with_adapter(config, adapter.clone()));
        (compute.clone(), adapter, MergeOrchestrator::new(compute, storage))
    }

    #[tokio::test]
    async fn test_merge_uploads_under_requested_id() {
        let (compute, adapter, orchestrator) = orchestrator(false);

        let outcome = orchestrator
            .merge(MergeRequest {
                video_id: Some("course-1".to_string()),
                scenes: vec![compiled(1, "https://v/b.mp4"), compiled(0, "https://v/a.mp4")],
                options: MergeOptions::default(),
            })
            .await
            .unwrap();

        assert_eq!(*compute.urls.lock().unwrap(), vec!["https://v/a.mp4", "https://v/b.mp4"]);
        assert_eq!(outcome.upload.video_id, "course-1");
        assert_eq!(outcome.scene_count, 2);
        assert_eq!(outcome.merge_time, Some(6.5));
        assert_eq!(adapter.stored("videos/course-1.mp4"), Some(Bytes::from_static(b"merged")));
    }

    #[tokio::test]
    async fn test_merge_generates_final_id() {
        let (_, _, orchestrator) = orchestrator(false);

        let outcome = orchestrator
            .merge(MergeRequest {
                video_id: None,
                scenes: vec![compiled(0, "https://v/a.mp4")],
                options: MergeOptions::default(),
            })
            .await
            .unwrap();

        assert!(outcome.upload.video_id.starts_with("final-"));
    }

    #[tokio::test]
    async fn test_invalid_scenes_never_reach_compute() {
        let (compute, adapter, orchestrator) = orchestrator(false);

        let err = orchestrator
            .merge(MergeRequest {
                video_id: None,
                scenes: vec![compiled(0, "a"), compiled(0, "b")],
                options: MergeOptions::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::Validation(_)));
        assert!(compute.urls.lock().unwrap().is_empty());
        assert_eq!(adapter.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_unsafe_video_id_rejected_before_compute() {
        let (compute, adapter, orchestrator) = orchestrator(false);

        let err = orchestrator
            .merge(MergeRequest {
                video_id: Some("lesson#2".to_string()),
                scenes: vec![compiled(0, "https://v/a.mp4")],
                options: MergeOptions::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::InvalidVideoId(ref id) if id == "lesson#2"));
        assert!(compute.urls.lock().unwrap().is_empty());
        assert_eq!(adapter.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_compute_failure_skips_upload() {
        let (_, adapter, orchestrator) = orchestrator(true);

        let err = orchestrator
            .merge(MergeRequest {
                video_id: None,
                scenes: vec![compiled(0, "a")],
                options: MergeOptions::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::Compute(_)));
        assert_eq!(adapter.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_surfaced() {
        let (_, adapter, orchestrator) = orchestrator(false);
        adapter.fail_with("bucket unreachable");

        let err = orchestrator
            .merge(MergeRequest {
                video_id: None,
                scenes: vec![compiled(0, "a")],
                options: MergeOptions::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::Storage(_)));
    }
}
