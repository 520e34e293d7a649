//! Application-wide constants.

/// Logical prefix every video artifact lives under: `videos/<id>.mp4`.
pub const VIDEO_PREFIX: &str = "videos/";

pub const VIDEO_EXTENSION: &str = "mp4";

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Retrieval endpoint used when no durable public URL can be synthesized.
pub const VIDEO_RETRIEVAL_PATH: &str = "/api/videos";

/// Provider-side default for listings without an explicit limit.
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// Quality tier requested from the remote compute service.
pub const REMOTE_QUALITY_TIER: &str = "low_quality";
