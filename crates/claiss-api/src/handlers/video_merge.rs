use crate::constants::API_PREFIX;
use crate::error::{error_response_with_duration, format_millis, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use claiss_core::{AppError, MergeOptions, Scene};
use claiss_processing::MergeRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeVideosRequest {
    #[serde(default)]
    pub video_id: Option<String>,
    /// Kept optional so a missing list gets a specific message.
    #[serde(default)]
    pub scenes: Option<Vec<Scene>>,
    #[serde(default)]
    pub options: MergeOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeVideosResponse {
    pub success: bool,
    pub video_url: String,
    pub video_id: String,
    /// Wall-clock time of the whole request, e.g. `"5230ms"`.
    pub duration: String,
    /// Seconds the compute service reported for the merge itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_time: Option<f64>,
    pub scene_count: usize,
}

pub async fn merge_videos(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<MergeVideosRequest>,
) -> Response {
    let start = Instant::now();

    let Some(scenes) = request.scenes else {
        return error_response_with_duration(
            HttpAppError(AppError::InvalidInput("Scenes array is required".to_string())),
            start.elapsed(),
        );
    };

    let outcome = state
        .merge
        .merge(MergeRequest {
            video_id: request.video_id,
            scenes,
            options: request.options,
        })
        .await;

    match outcome {
        Ok(outcome) => Json(MergeVideosResponse {
            success: true,
            video_url: outcome.upload.url,
            video_id: outcome.upload.video_id,
            duration: format_millis(start.elapsed()),
            merge_time: outcome.merge_time,
            scene_count: outcome.scene_count,
        })
        .into_response(),
        Err(e) => error_response_with_duration(HttpAppError(e.into()), start.elapsed()),
    }
}

/// Describe the merge endpoint for clients probing it with GET.
pub async fn merge_capabilities() -> impl IntoResponse {
    let defaults = MergeOptions::default();
    Json(serde_json::json!({
        "name": "Video Merge API",
        "description": "Merges compiled scene videos into one final video",
        "endpoint": format!("{}/video-merge", API_PREFIX),
        "method": "POST",
        "body": {
            "videoId": "optional id for the merged video",
            "scenes": "array of { order, status, videoUrl }; every scene must be compiled",
            "options": {
                "addTransitions": defaults.add_transitions,
                "transitionDuration": defaults.transition_duration,
            },
        },
        "requirements": [
            "At least one scene",
            "Every scene has status 'compiled' and a videoUrl",
            "Scene orders are exactly 0..n-1 with no gaps or duplicates",
        ],
    }))
}
