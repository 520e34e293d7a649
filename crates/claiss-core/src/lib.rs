//! Claiss Core Library
//!
//! This crate provides the domain models, error taxonomy and configuration
//! shared by the storage, processing and API crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, BlobConfig, ComputeConfig, Config, S3Config, StorageConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    Access, CompilationResult, ComputeTier, ListOptions, ListResult, MergeOptions, Scene,
    SceneStatus, StorageObject, UploadOptions, UploadResult,
};
pub use storage_types::StorageProvider;
