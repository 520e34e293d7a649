//! Value types for the storage adapter contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visibility flag passed through to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Private,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Private => "private",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOptions {
    pub access: Access,
    pub content_type: String,
    pub add_random_suffix: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            access: Access::Public,
            content_type: crate::constants::VIDEO_CONTENT_TYPE.to_string(),
            add_random_suffix: false,
        }
    }
}

impl UploadOptions {
    /// Public `video/mp4` upload, the shape every compile and merge result uses.
    pub fn public_video() -> Self {
        Self::default()
    }

    pub fn with_random_suffix(mut self) -> Self {
        self.add_random_suffix = true;
        self
    }
}

/// Outcome of one successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub url: String,
    pub pathname: String,
    pub video_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    pub prefix: Option<String>,
    pub limit: Option<usize>,
}

impl ListOptions {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One persisted artifact as reported by a provider listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObject {
    pub url: String,
    pub pathname: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResult {
    pub blobs: Vec<StorageObject>,
}

impl ListResult {
    /// Most recently uploaded object. Providers do not guarantee listing order.
    pub fn latest(&self) -> Option<&StorageObject> {
        self.blobs.iter().max_by_key(|blob| blob.uploaded_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn object(pathname: &str, secs: i64) -> StorageObject {
        StorageObject {
            url: format!("https://cdn.example.com/{}", pathname),
            pathname: pathname.to_string(),
            size: 10,
            uploaded_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_latest_ignores_listing_order() {
        let result = ListResult {
            blobs: vec![
                object("videos/a.mp4", 100),
                object("videos/c.mp4", 300),
                object("videos/b.mp4", 200),
            ],
        };
        assert_eq!(result.latest().unwrap().pathname, "videos/c.mp4");
        assert!(ListResult::default().latest().is_none());
    }

    #[test]
    fn test_upload_options_defaults() {
        let options = UploadOptions::public_video();
        assert_eq!(options.access, Access::Public);
        assert_eq!(options.content_type, "video/mp4");
        assert!(!options.add_random_suffix);
        assert!(options.with_random_suffix().add_random_suffix);
    }
}
