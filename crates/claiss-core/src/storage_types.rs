use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage provider selection
///
/// Resolved once from `STORAGE_PROVIDER` at configuration time. Unrecognized
/// names are rejected there instead of silently defaulting at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageProvider {
    /// Pick based on which credential sets are present.
    #[default]
    Auto,
    VercelBlob,
    S3,
}

impl FromStr for StorageProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(StorageProvider::Auto),
            "vercel-blob" | "vercel" | "blob" => Ok(StorageProvider::VercelBlob),
            "s3" => Ok(StorageProvider::S3),
            _ => Err(anyhow::anyhow!("Invalid storage provider: {}", s)),
        }
    }
}

impl Display for StorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageProvider::Auto => write!(f, "auto"),
            StorageProvider::VercelBlob => write!(f, "vercel-blob"),
            StorageProvider::S3 => write!(f, "s3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("vercel".parse::<StorageProvider>().unwrap(), StorageProvider::VercelBlob);
        assert_eq!("Vercel-Blob".parse::<StorageProvider>().unwrap(), StorageProvider::VercelBlob);
        assert_eq!(" s3 ".parse::<StorageProvider>().unwrap(), StorageProvider::S3);
        assert_eq!("AUTO".parse::<StorageProvider>().unwrap(), StorageProvider::Auto);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("gcs".parse::<StorageProvider>().is_err());
    }
}
