use crate::constants::{API_PREFIX, SERVICE_NAME, SERVICE_VERSION};
use crate::error::format_millis;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub response_time: String,
    pub version: &'static str,
    pub service: ServiceInfo,
    pub dependencies: Dependencies,
    pub endpoints: Vec<EndpointInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependencies {
    pub storage: StorageHealth,
    pub remote_compute: ComputeHealth,
    pub authentication: AuthHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageHealth {
    /// Adapter actually in use, `None` when none could be built.
    pub provider: Option<String>,
    /// Provider requested through configuration.
    pub configured: String,
    pub available: AvailableProviders,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableProviders {
    pub s3: bool,
    pub vercel_blob: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeHealth {
    pub configured: bool,
    pub enabled: bool,
    pub fallback_to_local: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthHealth {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: String,
    pub description: &'static str,
}

fn endpoints() -> Vec<EndpointInfo> {
    [
        ("GET", "/health", "Service health and configuration"),
        ("POST", "/compile", "Compile one scene to video"),
        ("POST", "/video-merge", "Merge compiled scenes into one video"),
        ("GET", "/video-merge", "Describe the merge endpoint"),
        ("GET", "/videos", "Fetch a video by id, or the latest one"),
        ("HEAD", "/videos", "Video headers without the body"),
    ]
    .into_iter()
    .map(|(method, path, description)| EndpointInfo {
        method,
        path: format!("{}{}", API_PREFIX, path),
        description,
    })
    .collect()
}

/// Report configuration and which adapter the selector resolves to.
///
/// Unhealthy (503) only when no storage adapter can be built; remote compute
/// is reported but never probed.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let start = Instant::now();
    let storage_config = state.storage.config();
    let compute = state.compilation.settings();

    let (provider, error) = match state.storage.adapter().await {
        Ok(adapter) => (Some(adapter.provider_name()), None),
        Err(e) => {
            tracing::error!(error = %e, "Health check could not resolve a storage adapter");
            (None, Some(e.to_string()))
        }
    };

    let status_code = if error.is_none() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if error.is_none() { "healthy" } else { "unhealthy" },
        timestamp: Utc::now(),
        response_time: format_millis(start.elapsed()),
        version: SERVICE_VERSION,
        service: ServiceInfo {
            name: SERVICE_NAME,
            kind: "video-compilation",
            description: "Compiles and merges educational scene videos",
        },
        dependencies: Dependencies {
            storage: StorageHealth {
                provider,
                configured: storage_config.provider.to_string(),
                available: AvailableProviders {
                    s3: storage_config.has_s3_credentials(),
                    vercel_blob: storage_config.has_blob_credentials(),
                },
            },
            remote_compute: ComputeHealth {
                configured: state.remote_compute_configured,
                enabled: compute.remote_enabled,
                fallback_to_local: compute.fallback_to_local,
            },
            authentication: AuthHealth {
                enabled: state.config.api_secret_key().is_some(),
            },
        },
        endpoints: endpoints(),
        error,
    };

    (status_code, Json(response))
}
