//! Merge endpoint integration tests.
//!
//! Run with: `cargo test -p claiss-api --test video_merge_test`

mod helpers;

use helpers::{api_path, setup_test_app, TestOptions};
use serde_json::json;

fn compiled(order: i64, url: &str) -> serde_json::Value {
    json!({ "order": order, "status": "compiled", "videoUrl": url })
}

#[tokio::test]
async fn test_merge_in_scene_order() {
    let app = setup_test_app(TestOptions::default());

    let response = app
        .client()
        .post(&api_path("/video-merge"))
        .json(&json!({
            "videoId": "course-42",
            "scenes": [compiled(1, "https://v/b.mp4"), compiled(0, "https://v/a.mp4")],
            "options": { "addTransitions": true }
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let data: serde_json::Value = response.json();
    assert_eq!(data["success"], true);
    assert_eq!(data["videoId"], "course-42");
    assert_eq!(data["sceneCount"], 2);
    assert_eq!(data["mergeTime"], 7.5);
    assert!(data["duration"].as_str().unwrap().ends_with("ms"));

    assert_eq!(
        *app.compute.merged_urls.lock().unwrap(),
        vec!["https://v/a.mp4", "https://v/b.mp4"]
    );
    assert_eq!(
        app.adapter.stored("videos/course-42.mp4").unwrap().as_ref(),
        b"merged-video"
    );
}

#[tokio::test]
async fn test_invalid_scenes_return_issues() {
    let app = setup_test_app(TestOptions::default());

    let response = app
        .client()
        .post(&api_path("/video-merge"))
        .json(&json!({
            "scenes": [
                compiled(0, "https://v/a.mp4"),
                { "order": 0, "status": "pending" }
            ]
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let data: serde_json::Value = response.json();
    assert_eq!(data["success"], false);
    assert_eq!(data["error"], "Scene validation failed");
    let issues = data["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 2);
    assert!(data["duration"].is_string());
    assert!(app.compute.merged_urls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_scenes_rejected() {
    let app = setup_test_app(TestOptions::default());

    let response = app
        .client()
        .post(&api_path("/video-merge"))
        .json(&json!({ "videoId": "x" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let data: serde_json::Value = response.json();
    assert_eq!(data["error"], "Scenes array is required");
}

#[tokio::test]
async fn test_unsafe_video_id_rejected() {
    let app = setup_test_app(TestOptions::default());

    let response = app
        .client()
        .post(&api_path("/video-merge"))
        .json(&json!({
            "videoId": "lesson#2",
            "scenes": [compiled(0, "https://v/a.mp4")]
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "INVALID_INPUT");
    assert!(data["error"].as_str().unwrap().contains("lesson#2"));
    assert!(app.compute.merged_urls.lock().unwrap().is_empty());
    assert_eq!(app.adapter.upload_calls(), 0);
}

#[tokio::test]
async fn test_compute_failure_is_reported() {
    let app = setup_test_app(TestOptions {
        remote_fail: Some("merge service down"),
        ..Default::default()
    });

    let response = app
        .client()
        .post(&api_path("/video-merge"))
        .json(&json!({ "scenes": [compiled(0, "https://v/a.mp4")] }))
        .await;

    assert_eq!(response.status_code(), 500);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "COMPILATION_ERROR");
    assert_eq!(app.adapter.upload_calls(), 0);
}

#[tokio::test]
async fn test_capabilities_describe_endpoint() {
    let app = setup_test_app(TestOptions::default());

    let response = app.client().get(&api_path("/video-merge")).await;

    assert_eq!(response.status_code(), 200);
    let data: serde_json::Value = response.json();
    assert_eq!(data["name"], "Video Merge API");
    assert_eq!(data["body"]["options"]["transitionDuration"], 0.5);
}
