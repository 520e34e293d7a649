use serde::{Deserialize, Serialize};

/// Lifecycle status of a scene as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    Pending,
    Compiling,
    Compiled,
    Failed,
    #[serde(other)]
    Unknown,
}

/// A client-supplied scene. Read-only for the merge path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub order: i64,
    pub status: SceneStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl Scene {
    /// Compiled and carrying a non-empty video reference.
    pub fn has_compiled_video(&self) -> bool {
        self.status == SceneStatus::Compiled
            && self
                .video_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty())
    }
}

pub const DEFAULT_TRANSITION_DURATION: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOptions {
    #[serde(default)]
    pub add_transitions: bool,
    #[serde(default = "default_transition_duration")]
    pub transition_duration: f64,
}

fn default_transition_duration() -> f64 {
    DEFAULT_TRANSITION_DURATION
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            add_transitions: false,
            transition_duration: DEFAULT_TRANSITION_DURATION,
        }
    }
}
