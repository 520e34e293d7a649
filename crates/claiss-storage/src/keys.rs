//! Storage path convention: `videos/<id>.mp4`.

use claiss_core::constants::{VIDEO_EXTENSION, VIDEO_PREFIX, VIDEO_RETRIEVAL_PATH};
use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

static VIDEO_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"videos/([^.]+)").expect("video id pattern is valid"));

static SAFE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("safe id pattern is valid"));

/// Storage path for a video id.
pub fn video_key(video_id: &str) -> String {
    format!("{}{}.{}", VIDEO_PREFIX, video_id, VIDEO_EXTENSION)
}

/// Extract `<id>` from a path following `videos/<id>.<ext>`.
pub fn video_id_from_path(path: &str) -> Option<String> {
    VIDEO_ID_PATTERN
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|id| !id.is_empty())
}

/// Whether a caller-chosen id maps to a key that every provider stores verbatim.
///
/// Dots are excluded since the id ends at the first `.` of the key.
pub fn is_safe_video_id(video_id: &str) -> bool {
    SAFE_VIDEO_ID.is_match(video_id)
}

/// Fresh, URL-safe video id.
pub fn generate_video_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "vid_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

/// Id derived from the path when it follows the convention, otherwise a new one.
pub fn resolve_video_id(path: &str) -> String {
    video_id_from_path(path).unwrap_or_else(generate_video_id)
}

/// Indirection through the service's own retrieval endpoint.
pub fn retrieval_url(video_id: &str) -> String {
    format!(
        "{}?id={}",
        VIDEO_RETRIEVAL_PATH,
        urlencoding::encode(video_id)
    )
}
