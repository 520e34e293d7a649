//! Error types module
//!
//! `AppError` is the taxonomy every component boundary reports in. Library
//! crates keep their own `thiserror` enums and convert into `AppError` where
//! a failure crosses into the HTTP layer.

use std::io;

use crate::models::ComputeTier;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing credentials or bucket. Fatal, never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Scene list rejected before any work was done.
    #[error("Validation failed: {}", issues.join("; "))]
    Validation { issues: Vec<String> },

    /// A provider failed after its retry budget was spent.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Both tiers of a fallback chain failed.
    #[error("All fallbacks exhausted (primary: {primary}, secondary: {secondary})")]
    FallbackExhausted { primary: String, secondary: String },

    #[error("{tier} compilation failed: {message}")]
    Compilation { tier: ComputeTier, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (u16, &'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::Configuration(_) => (
            500,
            "CONFIGURATION_ERROR",
            false,
            Some("Contact the operator to fix server configuration"),
            LogLevel::Error,
        ),
        AppError::Validation { .. } => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Fix the listed issues and resubmit"),
            LogLevel::Debug,
        ),
        AppError::Storage(_) => (
            502,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::FallbackExhausted { .. } => (
            503,
            "FALLBACK_EXHAUSTED",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::Compilation { .. } => (
            500,
            "COMPILATION_ERROR",
            false,
            Some("Check the scene source and logs"),
            LogLevel::Warn,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Use: Authorization: Bearer YOUR_API_KEY"),
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    pub fn validation(issues: Vec<String>) -> Self {
        AppError::Validation { issues }
    }

    /// Itemized issues for validation failures, empty otherwise.
    pub fn issues(&self) -> &[String] {
        match self {
            AppError::Validation { issues } => issues,
            _ => &[],
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Configuration(_) => "Server storage is not configured".to_string(),
            AppError::Validation { .. } => "Scene validation failed".to_string(),
            AppError::Storage(ref msg) => msg.clone(),
            AppError::FallbackExhausted { .. } => self.to_string(),
            AppError::Compilation { .. } => self.to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
