use crate::keys;
use crate::retry::RetryPolicy;
use crate::traits::{StorageAdapter, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use claiss_core::constants::DEFAULT_LIST_LIMIT;
use claiss_core::{ListOptions, ListResult, S3Config, StorageObject, UploadOptions, UploadResult};
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::{Path, PathPart};
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload, RetryConfig};
use std::sync::Arc;

const PROVIDER: &str = "s3";

/// S3-compatible object store implementation
///
/// Works against AWS S3 and any compatible endpoint (R2, MinIO, Spaces).
/// Uploads and listings go through the configured [`RetryPolicy`].
#[derive(Clone)]
pub struct S3Adapter {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    config: S3Config,
    retry: RetryPolicy,
}

impl S3Adapter {
    /// Build the adapter from configuration.
    ///
    /// Fails with [`StorageError::Configuration`] when the access key, secret
    /// or bucket is missing. No network call is made here.
    pub fn new(config: &S3Config, retry: RetryPolicy) -> StorageResult<Self> {
        let (Some(access_key_id), Some(secret_access_key), Some(bucket)) = (
            config.access_key_id.as_ref(),
            config.secret_access_key.as_ref(),
            config.bucket.as_ref(),
        ) else {
            return Err(StorageError::Configuration(
                "S3 credentials not configured. Set S3_ACCESS_KEY_ID, S3_SECRET_ACCESS_KEY and S3_BUCKET"
                    .to_string(),
            ));
        };

        let mut builder = AmazonS3Builder::new()
            .with_region(config.region.clone())
            .with_bucket_name(bucket.clone())
            .with_access_key_id(access_key_id.clone())
            .with_secret_access_key(secret_access_key.clone())
            .with_virtual_hosted_style_request(!config.force_path_style)
            // Backoff is owned by `retry`; one attempt is one request.
            .with_retry(RetryConfig {
                max_retries: 0,
                ..Default::default()
            });

        if let Some(ref endpoint) = config.endpoint {
            let endpoint = endpoint.trim_end_matches('/');
            let allow_http = endpoint.starts_with("http://");
            // Virtual-hosted requests against a custom endpoint expect the
            // bucket to already be part of the host.
            let endpoint = if config.force_path_style {
                endpoint.to_string()
            } else {
                virtual_hosted_endpoint(endpoint, bucket)
            };
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Configuration(e.to_string()))?;

        tracing::info!(
            bucket = %bucket,
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            force_path_style = config.force_path_style,
            "S3 adapter initialized"
        );

        Ok(Self::with_store(Arc::new(store), config, retry))
    }

    /// Wrap an existing object store. URLs are still derived from `config`.
    pub fn with_store(store: Arc<dyn ObjectStore>, config: &S3Config, retry: RetryPolicy) -> Self {
        Self {
            store,
            bucket: config.bucket.clone().unwrap_or_default(),
            config: config.clone(),
            retry,
        }
    }

    /// Public URL of an object key.
    ///
    /// A configured public base always wins. Otherwise the shape follows the
    /// endpoint and addressing style. Each key segment is percent-encoded.
    pub fn object_url(&self, key: &str) -> String {
        let key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        if let Some(ref base) = self.config.public_url_base {
            return format!("{}/{}", base.trim_end_matches('/'), key);
        }

        match self.config.endpoint {
            Some(ref endpoint) => {
                let endpoint = endpoint.trim_end_matches('/');
                if self.config.force_path_style {
                    format!("{}/{}/{}", endpoint, self.bucket, key)
                } else {
                    format!("{}/{}", virtual_hosted_endpoint(endpoint, &self.bucket), key)
                }
            }
            None if self.config.force_path_style => format!(
                "https://s3.{}.amazonaws.com/{}/{}",
                self.config.region, self.bucket, key
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.config.region, key
            ),
        }
    }

    async fn put_once(&self, location: &Path, data: Bytes, options: &UploadOptions) -> StorageResult<()> {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, options.content_type.clone().into());
        // object_store has no canned ACLs; record the requested access as metadata.
        attributes.insert(
            Attribute::Metadata("access".into()),
            options.access.as_str().into(),
        );

        let put_options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(location, PutPayload::from(data), put_options)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::provider(PROVIDER, e.to_string()))
    }

    async fn list_once(&self, prefix: &str, limit: usize) -> StorageResult<Vec<StorageObject>> {
        // object_store lists by path segment; list the enclosing directory and
        // apply the prefix as a plain string match.
        let directory = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };
        let directory = (!directory.is_empty()).then(|| Path::from(directory));
        let prefix = stored_prefix(prefix);

        let mut stream = self.store.list(directory.as_ref());
        let mut blobs = Vec::new();

        while let Some(meta) = stream.next().await {
            let meta = meta.map_err(|e| StorageError::provider(PROVIDER, e.to_string()))?;
            let key = meta.location.to_string();
            if !key.starts_with(&prefix) {
                continue;
            }
            blobs.push(StorageObject {
                url: self.object_url(&key),
                pathname: key,
                size: meta.size as u64,
                uploaded_at: meta.last_modified,
            });
            if blobs.len() >= limit {
                break;
            }
        }

        Ok(blobs)
    }
}

/// A raw prefix in the escaped form object_store gives stored keys, so that
/// a key is found by its own path.
fn stored_prefix(prefix: &str) -> String {
    prefix
        .split('/')
        .map(|segment| PathPart::from(segment).as_ref().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// `https://host` + `bucket` -> `https://bucket.host`
fn virtual_hosted_endpoint(endpoint: &str, bucket: &str) -> String {
    match endpoint.split_once("://") {
        Some((scheme, host)) => format!("{}://{}.{}", scheme, bucket, host),
        None => format!("https://{}.{}", bucket, endpoint),
    }
}

#[async_trait]
impl StorageAdapter for S3Adapter {
    /// `add_random_suffix` is ignored: keys are used exactly as given.
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<UploadResult> {
        let location = Path::from(path);
        let size = data.len();
        let start = std::time::Instant::now();

        self.retry
            .run_while("s3 upload", StorageError::is_retryable, || {
                self.put_once(&location, data.clone(), options)
            })
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %path,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
            })?;

        let url = self.object_url(location.as_ref());
        let video_id = keys::resolve_video_id(path);

        tracing::info!(
            bucket = %self.bucket,
            key = %path,
            video_id = %video_id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(UploadResult {
            url,
            pathname: location.to_string(),
            video_id,
        })
    }

    async fn list(&self, options: &ListOptions) -> StorageResult<ListResult> {
        let prefix = options.prefix.as_deref().unwrap_or("");
        let limit = options.limit.unwrap_or(DEFAULT_LIST_LIMIT);

        let blobs = self
            .retry
            .run_while("s3 list", StorageError::is_retryable, || {
                self.list_once(prefix, limit)
            })
            .await?;

        tracing::debug!(
            bucket = %self.bucket,
            prefix = %prefix,
            count = blobs.len(),
            "S3 listing complete"
        );

        Ok(ListResult { blobs })
    }

    fn public_url(&self, video_id: &str) -> String {
        self.object_url(Path::from(keys::video_key(video_id)).as_ref())
    }

    fn provider_name(&self) -> String {
        PROVIDER.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::ObjectStoreExt;
    use std::time::Duration;

    fn config() -> S3Config {
        S3Config {
            endpoint: None,
            region: "us-east-1".to_string(),
            access_key_id: Some("key".to_string()),
            secret_access_key: Some("secret".to_string()),
            bucket: Some("claiss-videos".to_string()),
            public_url_base: None,
            force_path_style: false,
        }
    }

    fn in_memory(config: &S3Config) -> (Arc<InMemory>, S3Adapter) {
        let store = Arc::new(InMemory::new());
        let adapter = S3Adapter::with_store(
            store.clone(),
            config,
            RetryPolicy::new(1, Duration::from_millis(1)),
        );
        (store, adapter)
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut cfg = config();
        cfg.secret_access_key = None;
        let err = S3Adapter::new(&cfg, RetryPolicy::default()).err().unwrap();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_url_shapes() {
        let mut cfg = config();
        let (_, adapter) = in_memory(&cfg);
        assert_eq!(
            adapter.object_url("videos/a.mp4"),
            "https://claiss-videos.s3.us-east-1.amazonaws.com/videos/a.mp4"
        );

        cfg.force_path_style = true;
        let (_, adapter) = in_memory(&cfg);
        assert_eq!(
            adapter.object_url("videos/a.mp4"),
            "https://s3.us-east-1.amazonaws.com/claiss-videos/videos/a.mp4"
        );

        cfg.endpoint = Some("https://r2.example.com/".to_string());
        let (_, adapter) = in_memory(&cfg);
        assert_eq!(
            adapter.object_url("videos/a.mp4"),
            "https://r2.example.com/claiss-videos/videos/a.mp4"
        );

        cfg.force_path_style = false;
        let (_, adapter) = in_memory(&cfg);
        assert_eq!(
            adapter.object_url("videos/a.mp4"),
            "https://claiss-videos.r2.example.com/videos/a.mp4"
        );

        cfg.public_url_base = Some("https://cdn.example.com/".to_string());
        let (_, adapter) = in_memory(&cfg);
        assert_eq!(adapter.public_url("abc"), "https://cdn.example.com/videos/abc.mp4");
    }

    #[tokio::test]
    async fn test_upload_then_list() {
        let (store, adapter) = in_memory(&config());

        let result = adapter
            .upload(
                "videos/abc123.mp4",
                Bytes::from_static(b"fake mp4"),
                &UploadOptions::public_video(),
            )
            .await
            .unwrap();

        assert_eq!(result.video_id, "abc123");
        assert_eq!(result.pathname, "videos/abc123.mp4");
        assert_eq!(result.url, adapter.public_url("abc123"));

        let stored = store
            .get(&Path::from("videos/abc123.mp4"))
            .await
            .unwrap();
        let content_type: Option<&str> = stored
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.as_ref());
        assert_eq!(content_type, Some("video/mp4"));
        assert_eq!(stored.bytes().await.unwrap(), Bytes::from_static(b"fake mp4"));

        let listing = adapter
            .list(&ListOptions::prefix("videos/abc123"))
            .await
            .unwrap();
        assert_eq!(listing.blobs.len(), 1);
        assert_eq!(listing.blobs[0].pathname, "videos/abc123.mp4");
        assert_eq!(listing.blobs[0].url, result.url);
        assert_eq!(listing.blobs[0].size, 8);
    }

    #[tokio::test]
    async fn test_escaped_keys_are_found_by_their_own_path() {
        let (_, adapter) = in_memory(&config());

        for (key, prefix) in [
            ("videos/lesson#2.mp4", "videos/lesson#2"),
            ("videos/a~b.mp4", "videos/a~b"),
            ("videos/50%.mp4", "videos/50%"),
        ] {
            let uploaded = adapter
                .upload(key, Bytes::from_static(b"x"), &UploadOptions::public_video())
                .await
                .unwrap();
            assert!(!uploaded.url.contains('#'), "{} leaked a fragment", uploaded.url);

            let listing = adapter.list(&ListOptions::prefix(prefix)).await.unwrap();
            assert_eq!(listing.blobs.len(), 1, "{key} not found by prefix {prefix}");
            assert_eq!(listing.blobs[0].pathname, uploaded.pathname);
            assert_eq!(listing.blobs[0].url, uploaded.url);
        }
    }

    #[tokio::test]
    async fn test_failing_endpoint_sees_one_request_per_attempt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", mockito::Matcher::Any)
            .with_status(503)
            .with_body("<Error><Code>SlowDown</Code></Error>")
            .expect(3)
            .create_async()
            .await;

        let mut cfg = config();
        cfg.endpoint = Some(server.url());
        cfg.force_path_style = true;
        let adapter = S3Adapter::new(&cfg, RetryPolicy::new(3, Duration::from_millis(1))).unwrap();

        let err = adapter
            .upload(
                "videos/abc.mp4",
                Bytes::from_static(b"mp4"),
                &UploadOptions::public_video(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Provider { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_prefix_is_string_match_with_limit() {
        let (_, adapter) = in_memory(&config());
        for key in ["videos/final-1.mp4", "videos/final-2.mp4", "videos/scene-1.mp4", "other/x.mp4"] {
            adapter
                .upload(key, Bytes::from_static(b"x"), &UploadOptions::public_video())
                .await
                .unwrap();
        }

        let finals = adapter.list(&ListOptions::prefix("videos/final-")).await.unwrap();
        assert_eq!(finals.blobs.len(), 2);
        assert!(finals.blobs.iter().all(|b| b.pathname.starts_with("videos/final-")));

        let everything = adapter.list(&ListOptions::default()).await.unwrap();
        assert_eq!(everything.blobs.len(), 4);

        let capped = adapter
            .list(&ListOptions::prefix("videos/").with_limit(2))
            .await
            .unwrap();
        assert_eq!(capped.blobs.len(), 2);
    }

    #[test]
    fn test_provider_name() {
        let (_, adapter) = in_memory(&config());
        assert_eq!(adapter.provider_name(), "s3");
    }
}
