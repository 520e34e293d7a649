//! Test helpers for storage consumers
//!
//! [`MockAdapter`] keeps objects in memory, counts calls and can be switched
//! into a failing mode, so orchestration code can be tested without a
//! provider.

use crate::keys;
use crate::traits::{StorageAdapter, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use claiss_core::{ListOptions, ListResult, StorageObject, UploadOptions, UploadResult};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct MockAdapter {
    name: &'static str,
    objects: Mutex<BTreeMap<String, (Bytes, StorageObject)>>,
    failure: Mutex<Option<String>>,
    upload_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MockAdapter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            objects: Mutex::new(BTreeMap::new()),
            failure: Mutex::new(None),
            upload_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Make every following call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn stored(&self, path: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .map(|(data, _)| data.clone())
    }

    fn check_failure(&self) -> StorageResult<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(StorageError::provider(self.name, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StorageAdapter for MockAdapter {
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        _options: &UploadOptions,
    ) -> StorageResult<UploadResult> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let video_id = keys::resolve_video_id(path);
        let url = format!("https://{}.test/{}", self.name, path);
        let object = StorageObject {
            url: url.clone(),
            pathname: path.to_string(),
            size: data.len() as u64,
            uploaded_at: Utc::now(),
        };
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), (data, object));

        Ok(UploadResult {
            url,
            pathname: path.to_string(),
            video_id,
        })
    }

    async fn list(&self, options: &ListOptions) -> StorageResult<ListResult> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let prefix = options.prefix.as_deref().unwrap_or("");
        let blobs = self
            .objects
            .lock()
            .unwrap()
            .values()
            .filter(|(_, object)| object.pathname.starts_with(prefix))
            .take(options.limit.unwrap_or(usize::MAX))
            .map(|(_, object)| object.clone())
            .collect();

        Ok(ListResult { blobs })
    }

    fn public_url(&self, video_id: &str) -> String {
        format!("https://{}.test/{}", self.name, keys::video_key(video_id))
    }

    fn provider_name(&self) -> String {
        self.name.to_string()
    }
}
