//! Shared helpers: a store wrapper that counts calls and fails on demand.

#![allow(dead_code)]

use async_trait::async_trait;
use bucket_browser::{
    models::object::{LevelListing, ObjectBody, StoredObject},
    services::browser::BrowserService,
    store::{ObjectStore, StoreError, StoreResult, memory::MemoryStore},
};
use bytes::Bytes;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Wraps a `MemoryStore`, recording `delete_many` batch sizes and injecting
/// failures.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub delete_many_calls: AtomicUsize,
    pub batch_sizes: std::sync::Mutex<Vec<usize>>,
    /// 1-based `delete_many` call that fails; 0 disables.
    pub fail_delete_call: AtomicUsize,
    /// Fail every put whose key ends in `/`.
    pub fail_marker_puts: AtomicBool,
    /// Fail `get` for this key.
    pub fail_get_key: std::sync::Mutex<Option<String>>,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn seed(&self, key: &str, body: &str) {
        self.inner
            .put(key, Bytes::from(body.to_string()), "text/plain")
            .await
            .unwrap();
    }
}

#[async_trait]
impl ObjectStore for FlakyStore {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StoreResult<()> {
        if key.ends_with('/') && self.fail_marker_puts.load(Ordering::SeqCst) {
            return Err(StoreError::backend("put_object", "AccessDenied"));
        }
        self.inner.put(key, body, content_type).await
    }

    async fn get(&self, key: &str) -> StoreResult<ObjectBody> {
        if self.fail_get_key.lock().unwrap().as_deref() == Some(key) {
            return Err(StoreError::backend("get_object", "InternalError"));
        }
        self.inner.get(key).await
    }

    async fn list_one_level(&self, prefix: &str, delimiter: &str) -> StoreResult<LevelListing> {
        self.inner.list_one_level(prefix, delimiter).await
    }

    async fn list_all(&self, prefix: &str) -> StoreResult<Vec<StoredObject>> {
        self.inner.list_all(prefix).await
    }

    async fn delete_one(&self, key: &str) -> StoreResult<()> {
        self.inner.delete_one(key).await
    }

    async fn delete_many(&self, keys: &[String]) -> StoreResult<()> {
        let call = self.delete_many_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.batch_sizes.lock().unwrap().push(keys.len());
        if call == self.fail_delete_call.load(Ordering::SeqCst) {
            return Err(StoreError::backend("delete_objects", "SlowDown"));
        }
        self.inner.delete_many(keys).await
    }
}

pub fn browser(store: Arc<FlakyStore>, base: &str) -> BrowserService {
    BrowserService::new(store, base)
}
