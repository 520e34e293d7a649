//! Processing error types

use claiss_core::{AppError, ComputeTier};
use claiss_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the remote compute service.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Remote compute service not configured (REMOTE_COMPUTE_URL is unset)")]
    NotConfigured,

    #[error("Remote compute request failed: {0}")]
    Request(String),

    #[error("Remote compute returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid remote compute response: {0}")]
    InvalidResponse(String),

    /// The service answered but reported failure.
    #[error("{message}")]
    Rejected {
        message: String,
        logs: Option<String>,
        duration: Option<f64>,
    },
}

impl ComputeError {
    pub fn logs(&self) -> Option<String> {
        match self {
            ComputeError::Rejected { logs, .. } => logs.clone(),
            _ => None,
        }
    }

    pub fn duration(&self) -> Option<f64> {
        match self {
            ComputeError::Rejected { duration, .. } => *duration,
            _ => None,
        }
    }
}

/// Failures of the local renderer process.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Local renderer timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, logs: String },

    #[error("Local renderer exited with {status}")]
    Exit { status: String, logs: String },

    #[error("Video file was not generated at expected path: {}", path.display())]
    MissingArtifact { path: PathBuf, logs: String },

    #[error("Failed to run local renderer: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Captured renderer output, when the process got far enough to produce any.
    pub fn logs(&self) -> Option<String> {
        match self {
            RenderError::Timeout { logs, .. }
            | RenderError::Exit { logs, .. }
            | RenderError::MissingArtifact { logs, .. } => Some(logs.clone()),
            RenderError::Io(_) => None,
        }
    }
}

/// Both persistence tiers failed.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to save video (Storage: {storage}, disk: {disk})")]
    FallbackExhausted { storage: String, disk: String },
}

impl From<PersistError> for AppError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::FallbackExhausted { storage, disk } => AppError::FallbackExhausted {
                primary: storage,
                secondary: disk,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Scene validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Invalid videoId {0:?}: use letters, digits, '-' or '_'")]
    InvalidVideoId(String),

    #[error(transparent)]
    Compute(#[from] ComputeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl MergeError {
    pub fn validation(issue: impl Into<String>) -> Self {
        MergeError::Validation(vec![issue.into()])
    }
}

impl From<MergeError> for AppError {
    fn from(err: MergeError) -> Self {
        match err {
            MergeError::Validation(issues) => AppError::Validation { issues },
            e @ MergeError::InvalidVideoId(_) => AppError::InvalidInput(e.to_string()),
            MergeError::Compute(e) => AppError::Compilation {
                tier: ComputeTier::Remote,
                message: e.to_string(),
            },
            MergeError::Storage(e) => e.into(),
        }
    }
}
