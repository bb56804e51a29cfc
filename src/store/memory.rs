//! In-process object store with S3 listing semantics.
//!
//! Objects live in a `BTreeMap` so listings come back in lexicographic key
//! order, the same order S3 uses. Used for local runs (`--store memory`) and
//! throughout the test suite.

use crate::{
    models::object::{LevelListing, ObjectBody, StoredObject},
    store::{MAX_DELETE_BATCH, ObjectStore, StoreError, StoreResult},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream;
use std::{
    collections::{BTreeMap, BTreeSet},
    io,
};
use tokio::sync::RwLock;

const MAX_OBJECT_KEY_LEN: usize = 1024;

#[derive(Clone, Debug)]
struct MemoryObject {
    body: Bytes,
    content_type: String,
    etag: String,
    last_modified: DateTime<Utc>,
}

impl MemoryObject {
    fn describe(&self, key: &str) -> StoredObject {
        StoredObject {
            key: key.to_string(),
            size: self.body.len() as u64,
            last_modified: Some(self.last_modified),
            content_type: Some(self.content_type.clone()),
            etag: Some(self.etag.clone()),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, MemoryObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects, markers included.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// All stored keys in lexicographic order.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// Rejects keys S3 itself would refuse, plus backslashes.
    fn ensure_key_safe(key: &str) -> StoreResult<()> {
        if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
            return Err(StoreError::backend("put", format!("invalid key `{key}`")));
        }
        if key.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
            return Err(StoreError::backend("put", format!("invalid key `{key}`")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StoreResult<()> {
        Self::ensure_key_safe(key)?;
        let etag = format!("{:x}", md5::compute(&body));
        let object = MemoryObject {
            body,
            content_type: content_type.to_string(),
            etag,
            last_modified: Utc::now(),
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<ObjectBody> {
        let guard = self.objects.read().await;
        let object = guard.get(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;

        let body = object.body.clone();
        Ok(ObjectBody {
            content_length: Some(body.len() as u64),
            content_type: Some(object.content_type.clone()),
            stream: Box::pin(stream::once(async move { Ok::<_, io::Error>(body) })),
        })
    }

    async fn list_one_level(&self, prefix: &str, delimiter: &str) -> StoreResult<LevelListing> {
        let guard = self.objects.read().await;
        let mut common_prefixes = BTreeSet::new();
        let mut objects = Vec::new();

        for (key, object) in guard.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            if let Some(group) = compute_common_prefix(key, prefix, delimiter) {
                common_prefixes.insert(group);
                continue;
            }
            objects.push(object.describe(key));
        }

        Ok(LevelListing {
            common_prefixes: common_prefixes.into_iter().collect(),
            objects,
        })
    }

    async fn list_all(&self, prefix: &str) -> StoreResult<Vec<StoredObject>> {
        let guard = self.objects.read().await;
        Ok(guard
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| object.describe(key))
            .collect())
    }

    async fn delete_one(&self, key: &str) -> StoreResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> StoreResult<()> {
        if keys.len() > MAX_DELETE_BATCH {
            return Err(StoreError::backend(
                "delete_many",
                format!("{} keys exceeds the batch limit of {MAX_DELETE_BATCH}", keys.len()),
            ));
        }
        let mut guard = self.objects.write().await;
        for key in keys {
            guard.remove(key);
        }
        Ok(())
    }
}

/// Compute the grouped "common prefix" a key falls under, S3 style.
///
/// Returns `None` when the key sits directly under `prefix` (no delimiter
/// after it), or when the delimiter is empty.
fn compute_common_prefix(key: &str, prefix: &str, delimiter: &str) -> Option<String> {
    if delimiter.is_empty() {
        return None;
    }
    let after_prefix = key.strip_prefix(prefix)?;
    let pos = after_prefix.find(delimiter)?;

    let mut combined = String::with_capacity(prefix.len() + pos + delimiter.len());
    combined.push_str(prefix);
    combined.push_str(&after_prefix[..pos + delimiter.len()]);
    Some(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(keys: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for key in keys {
            store
                .put(key, Bytes::from_static(b"x"), "text/plain")
                .await
                .unwrap();
        }
        store
    }

    #[test]
    fn common_prefix_grouping() {
        assert_eq!(
            compute_common_prefix("root/a/b.txt", "root/", "/"),
            Some("root/a/".to_string())
        );
        assert_eq!(compute_common_prefix("root/b.txt", "root/", "/"), None);
        assert_eq!(
            compute_common_prefix("root/a/", "root/", "/"),
            Some("root/a/".to_string())
        );
        assert_eq!(compute_common_prefix("other/a", "root/", "/"), None);
    }

    #[tokio::test]
    async fn one_level_listing_groups_children() {
        let store = seeded(&["docs/a.txt", "docs/deep/b.txt", "readme.txt", "docsx"]).await;
        let level = store.list_one_level("", "/").await.unwrap();
        assert_eq!(level.common_prefixes, vec!["docs/".to_string()]);
        let keys: Vec<_> = level.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["docsx", "readme.txt"]);

        let level = store.list_one_level("docs/", "/").await.unwrap();
        assert_eq!(level.common_prefixes, vec!["docs/deep/".to_string()]);
        assert_eq!(level.objects.len(), 1);
    }

    #[tokio::test]
    async fn list_all_stays_inside_prefix() {
        let store = seeded(&["a/1", "a/b/2", "ab/3", "b/4"]).await;
        let keys: Vec<_> = store
            .list_all("a/")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["a/1", "a/b/2"]);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_many_rejects_oversized_batches() {
        let store = MemoryStore::new();
        let keys: Vec<String> = (0..=MAX_DELETE_BATCH).map(|i| format!("k{i}")).collect();
        assert!(store.delete_many(&keys).await.is_err());
    }

    #[tokio::test]
    async fn put_rejects_backslashes() {
        let store = MemoryStore::new();
        assert!(store.put("a\\b", Bytes::new(), "text/plain").await.is_err());
    }
}
