//! Configuration module
//!
//! Configuration is read once at startup from the process environment (with
//! `.env` support) into an immutable [`Config`] that is handed to every
//! component that needs it. Parsing goes through a lookup function so the
//! rules can be exercised without touching the real environment.

use std::env;
use std::path::PathBuf;

use crate::storage_types::StorageProvider;

const SERVER_PORT: u16 = 3000;
const S3_REGION: &str = "us-east-1";
const BLOB_API_URL: &str = "https://blob.vercel-storage.com";
const RETRY_MAX_ATTEMPTS: u32 = 5;
const RETRY_BASE_DELAY_MS: u64 = 1000;
const REMOTE_COMPUTE_TIMEOUT_SECS: u64 = 300;
const RENDERER_PATH: &str = "manim";
const RENDERER_WORK_DIR: &str = "/tmp/manim-current";
const RENDERER_TIMEOUT_SECS: u64 = 120;
const LOCAL_FALLBACK_PATH: &str = "/tmp/latest.mp4";

/// Service-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    /// Bearer secret for `/api/*`. `None` disables authentication.
    pub api_secret_key: Option<String>,
    pub log_json: bool,
}

/// Managed blob service credentials
#[derive(Clone, Debug, Default)]
pub struct BlobConfig {
    pub token: Option<String>,
    pub api_url: String,
}

/// S3-compatible object store settings
#[derive(Clone, Debug, Default)]
pub struct S3Config {
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: Option<String>,
    pub public_url_base: Option<String>,
    pub force_path_style: bool,
}

impl S3Config {
    /// Credentials and bucket are all present.
    pub fn is_configured(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some() && self.bucket.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub blob: BlobConfig,
    pub s3: S3Config,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl StorageConfig {
    pub fn has_blob_credentials(&self) -> bool {
        self.blob.token.is_some()
    }

    pub fn has_s3_credentials(&self) -> bool {
        self.s3.is_configured()
    }
}

/// Remote and local compute settings
#[derive(Clone, Debug)]
pub struct ComputeConfig {
    pub remote_enabled: bool,
    pub fallback_to_local: bool,
    pub remote_url: Option<String>,
    pub remote_token: Option<String>,
    pub remote_timeout_secs: u64,
    pub renderer_path: String,
    pub renderer_work_dir: PathBuf,
    pub renderer_timeout_secs: u64,
    /// Ephemeral disk tier used when every storage provider fails.
    pub local_fallback_path: PathBuf,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub storage: StorageConfig,
    pub compute: ComputeConfig,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Flags default to enabled; only an explicit `false` turns them off.
fn enabled_unless_false(value: Option<String>) -> bool {
    !matches!(value.as_deref().map(str::trim), Some(v) if v.eq_ignore_ascii_case("false"))
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        let provider = match get("STORAGE_PROVIDER") {
            Some(raw) => raw.parse::<StorageProvider>().map_err(|_| {
                anyhow::anyhow!(
                    "STORAGE_PROVIDER must be one of auto, vercel-blob, s3 (got '{}')",
                    raw
                )
            })?,
            None => StorageProvider::Auto,
        };

        let base = BaseConfig {
            server_port: match get("PORT") {
                Some(port) => port
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                None => SERVER_PORT,
            },
            environment: get("ENVIRONMENT")
                .or_else(|| get("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            api_secret_key: get("API_SECRET_KEY"),
            log_json: get("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        };

        let storage = StorageConfig {
            provider,
            blob: BlobConfig {
                token: get("BLOB_READ_WRITE_TOKEN"),
                api_url: get("BLOB_API_URL").unwrap_or_else(|| BLOB_API_URL.to_string()),
            },
            s3: S3Config {
                endpoint: get("S3_ENDPOINT").map(|e| e.trim_end_matches('/').to_string()),
                region: get("S3_REGION").unwrap_or_else(|| S3_REGION.to_string()),
                access_key_id: get("S3_ACCESS_KEY_ID"),
                secret_access_key: get("S3_SECRET_ACCESS_KEY"),
                bucket: get("S3_BUCKET"),
                public_url_base: get("S3_PUBLIC_URL_BASE")
                    .map(|b| b.trim_end_matches('/').to_string()),
                force_path_style: enabled_unless_false(get("S3_FORCE_PATH_STYLE")),
            },
            retry_max_attempts: get("STORAGE_RETRY_MAX_ATTEMPTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(RETRY_MAX_ATTEMPTS),
            retry_base_delay_ms: get("STORAGE_RETRY_BASE_DELAY_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(RETRY_BASE_DELAY_MS),
        };

        let compute = ComputeConfig {
            remote_enabled: enabled_unless_false(get("USE_REMOTE_COMPILATION")),
            fallback_to_local: enabled_unless_false(get("REMOTE_FALLBACK_TO_LOCAL")),
            remote_url: get("REMOTE_COMPUTE_URL").map(|u| u.trim_end_matches('/').to_string()),
            remote_token: get("REMOTE_COMPUTE_TOKEN"),
            remote_timeout_secs: get("REMOTE_COMPUTE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(REMOTE_COMPUTE_TIMEOUT_SECS),
            renderer_path: get("RENDERER_PATH").unwrap_or_else(|| RENDERER_PATH.to_string()),
            renderer_work_dir: get("RENDERER_WORK_DIR")
                .unwrap_or_else(|| RENDERER_WORK_DIR.to_string())
                .into(),
            renderer_timeout_secs: get("RENDERER_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(RENDERER_TIMEOUT_SECS),
            local_fallback_path: get("LOCAL_FALLBACK_PATH")
                .unwrap_or_else(|| LOCAL_FALLBACK_PATH.to_string())
                .into(),
        };

        let config = Config {
            base,
            storage,
            compute,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.base.api_secret_key.is_none() {
            return Err(anyhow::anyhow!(
                "API_SECRET_KEY must be set in production"
            ));
        }

        if self.storage.retry_max_attempts == 0 {
            return Err(anyhow::anyhow!(
                "STORAGE_RETRY_MAX_ATTEMPTS must be at least 1"
            ));
        }

        if self.compute.renderer_timeout_secs == 0 {
            return Err(anyhow::anyhow!("RENDERER_TIMEOUT_SECS must be positive"));
        }

        if let Some(ref url) = self.compute.remote_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "REMOTE_COMPUTE_URL must be an http(s) URL"
                ));
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn api_secret_key(&self) -> Option<&str> {
        self.base.api_secret_key.as_deref()
    }
}
