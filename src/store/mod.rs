//! Object store capability consumed by the browser.
//!
//! The browser never talks to a concrete client directly; it only sees the
//! [`ObjectStore`] trait. `s3` wraps the AWS SDK, `memory` keeps everything in
//! a `BTreeMap` with the same listing semantics.

pub mod memory;
pub mod s3;

use crate::models::object::{LevelListing, ObjectBody, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use thiserror::Error;

/// Largest number of keys a single `delete_many` call may carry (S3 limit).
pub const MAX_DELETE_BATCH: usize = 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object `{key}` not found")]
    NotFound { key: String },
    #[error("{op} failed: {message}")]
    Backend { op: &'static str, message: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StoreError {
    pub fn backend(op: &'static str, message: impl Into<String>) -> Self {
        StoreError::Backend {
            op,
            message: message.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The operations the virtual filesystem needs from a flat key/value store.
///
/// Keys are full keys (base prefix included). Puts overwrite, deletes of
/// missing keys succeed silently, just like S3.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend name for logs and readiness output.
    fn name(&self) -> &'static str;

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StoreResult<()>;

    /// Open a streaming read. Fails with [`StoreError::NotFound`] when absent.
    async fn get(&self, key: &str) -> StoreResult<ObjectBody>;

    /// One level under `prefix`, grouped on `delimiter`.
    async fn list_one_level(&self, prefix: &str, delimiter: &str) -> StoreResult<LevelListing>;

    /// Every object under `prefix`, at any depth.
    async fn list_all(&self, prefix: &str) -> StoreResult<Vec<StoredObject>>;

    async fn delete_one(&self, key: &str) -> StoreResult<()>;

    /// Delete up to [`MAX_DELETE_BATCH`] keys in one request. Any per-key
    /// failure fails the whole call.
    async fn delete_many(&self, keys: &[String]) -> StoreResult<()>;

    /// Cheap reachability check used by readiness probes.
    async fn probe(&self) -> StoreResult<()> {
        self.list_one_level("", "/").await.map(|_| ())
    }
}
