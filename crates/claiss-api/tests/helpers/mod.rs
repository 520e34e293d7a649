//! Test helpers: build AppState and router for integration tests.
//!
//! Storage is an in-memory `MockAdapter`; compute and rendering are stubs, so
//! no network or renderer binary is needed.
//! Run with: `cargo test -p claiss-api`.

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use claiss_api::constants;
use claiss_api::setup::routes;
use claiss_api::state::AppState;
use claiss_core::{Config, MergeOptions};
use claiss_processing::{
    ComputeError, ComputeService, LocalRender, RemoteMerge, RemoteRender, RenderError, Renderer,
};
use claiss_storage::test_helpers::MockAdapter;
use claiss_storage::StorageSelector;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const TEST_API_KEY: &str = "test-secret-key";

/// API path for tests (e.g. `/api/health`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub fn bearer() -> String {
    format!("Bearer {}", TEST_API_KEY)
}

/// Remote compute stub: fixed bytes, or a fixed failure.
pub struct StubCompute {
    pub fail: Option<&'static str>,
    pub merged_urls: Mutex<Vec<String>>,
}

#[async_trait]
impl ComputeService for StubCompute {
    async fn compile(&self, _code: &str, _class_name: &str) -> Result<RemoteRender, ComputeError> {
        if let Some(message) = self.fail {
            return Err(ComputeError::Request(message.to_string()));
        }
        Ok(RemoteRender {
            video: Bytes::from_static(b"remote-video"),
            logs: Some("rendered remotely".to_string()),
            duration: Some(3.0),
        })
    }

    async fn merge(
        &self,
        video_urls: &[String],
        _options: &MergeOptions,
    ) -> Result<RemoteMerge, ComputeError> {
        *self.merged_urls.lock().unwrap() = video_urls.to_vec();
        if let Some(message) = self.fail {
            return Err(ComputeError::Request(message.to_string()));
        }
        Ok(RemoteMerge {
            video: Bytes::from_static(b"merged-video"),
            duration: Some(7.5),
        })
    }
}

/// Local renderer stub that always succeeds.
pub struct StubRenderer;

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, _code: &str, _class_name: &str) -> Result<LocalRender, RenderError> {
        Ok(LocalRender {
            video: Bytes::from_static(b"local-video"),
            logs: "rendered locally".to_string(),
            duration: 0.5,
        })
    }
}

#[derive(Default)]
pub struct TestOptions {
    pub api_key: bool,
    pub remote_fail: Option<&'static str>,
    pub extra_env: Vec<(&'static str, String)>,
}

/// Test application: server plus handles on the stubs behind it.
pub struct TestApp {
    pub server: TestServer,
    pub adapter: Arc<MockAdapter>,
    pub compute: Arc<StubCompute>,
    pub disk_path: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn setup_test_app(options: TestOptions) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let disk_path = temp_dir.path().join("latest.mp4");

    let mut env: HashMap<&str, String> = HashMap::new();
    env.insert("LOCAL_FALLBACK_PATH", disk_path.display().to_string());
    env.insert("RENDERER_WORK_DIR", temp_dir.path().join("render").display().to_string());
    env.insert("REMOTE_COMPUTE_URL", "http://compute.test".to_string());
    if options.api_key {
        env.insert("API_SECRET_KEY", TEST_API_KEY.to_string());
    }
    for (key, value) in options.extra_env {
        env.insert(key, value);
    }
    let config = Config::from_lookup(|key| env.get(key).cloned()).expect("Invalid test config");

    let adapter = Arc::new(MockAdapter::new("s3"));
    let storage = Arc::new(StorageSelector::with_adapter(
        config.storage.clone(),
        adapter.clone(),
    ));
    let compute = Arc::new(StubCompute {
        fail: options.remote_fail,
        merged_urls: Mutex::new(Vec::new()),
    });

    let state = Arc::new(AppState::new(
        config.clone(),
        storage,
        compute.clone(),
        Arc::new(StubRenderer),
    ));
    let app = routes::setup_routes(&config, state);
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        adapter,
        compute,
        disk_path,
        _temp_dir: temp_dir,
    }
}
