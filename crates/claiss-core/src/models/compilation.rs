use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Which compute path produced the video bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeTier {
    Remote,
    Local,
}

impl Display for ComputeTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ComputeTier::Remote => write!(f, "remote"),
            ComputeTier::Local => write!(f, "local"),
        }
    }
}

/// Terminal outcome of one compilation request.
///
/// `compilation_type` reports the compute tier, independent of whether the
/// bytes ended up in object storage or on local disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
    pub compilation_type: ComputeTier,
    /// Seconds spent producing the bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl CompilationResult {
    pub fn succeeded(
        tier: ComputeTier,
        video_path: String,
        video_url: String,
        video_id: String,
    ) -> Self {
        Self {
            success: true,
            video_path: Some(video_path),
            video_url: Some(video_url),
            video_id: Some(video_id),
            error: None,
            logs: None,
            compilation_type: tier,
            duration: None,
        }
    }

    pub fn failed(tier: ComputeTier, error: impl Into<String>) -> Self {
        Self {
            success: false,
            video_path: None,
            video_url: None,
            video_id: None,
            error: Some(error.into()),
            logs: None,
            compilation_type: tier,
            duration: None,
        }
    }

    pub fn with_logs(mut self, logs: Option<String>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.duration = duration;
        self
    }
}
