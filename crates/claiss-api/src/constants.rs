//! Application-wide constants for the HTTP layer.

/// Every route lives under this prefix and behind the bearer gate.
pub const API_PREFIX: &str = "/api";

pub const SERVICE_NAME: &str = "Claiss API";

pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Request bodies are scene source or scene lists, never video bytes.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// How many recent objects the "latest video" lookup considers.
pub const LATEST_VIDEO_SCAN_LIMIT: usize = 10;

pub const MISSING_AUTH_MESSAGE: &str =
    "Missing or invalid Authorization header. Use: Authorization: Bearer YOUR_API_KEY";

pub const INVALID_KEY_MESSAGE: &str = "Invalid API key";
