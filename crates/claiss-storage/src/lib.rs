//! Claiss Storage Library
//!
//! This crate provides the storage contract for compiled videos and its
//! implementations: a managed blob service adapter, an S3-compatible adapter,
//! an auto-fallback decorator composing the two, and a last-resort local
//! disk tier.
//!
//! # Storage key format
//!
//! Every video lives at `videos/{id}.mp4`. Ids are derived from that path
//! whenever one is needed; key handling is centralized in the `keys` module
//! so all backends stay consistent.

#[cfg(feature = "storage-blob")]
pub mod blob;
pub mod factory;
pub mod fallback;
pub mod keys;
pub mod local;
pub mod retry;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-blob")]
pub use blob::VercelBlobAdapter;
pub use claiss_core::StorageProvider;
pub use factory::{build_adapter, StorageSelector};
pub use fallback::AutoFallbackAdapter;
pub use local::{LocalDiskTier, LocalVideo};
pub use retry::{with_retry, RetryPolicy};
#[cfg(feature = "storage-s3")]
pub use s3::S3Adapter;
pub use traits::{StorageAdapter, StorageError, StorageResult};
