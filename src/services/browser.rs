//! BrowserService: the virtual filesystem over a flat object store.
//!
//! Holds no state beyond the store handle and the base prefix; every call
//! re-queries the store. The operations themselves live next to this file:
//! `listing`, `folders`, `upload`, `delete`, `download`.

use crate::store::{ObjectStore, StoreError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("`{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("deleted {deleted} object(s) under `{path}`, {remaining} left after a failed batch: {source}")]
    PartialDelete {
        path: String,
        deleted: usize,
        remaining: usize,
        #[source]
        source: StoreError,
    },
    #[error("archive of `{path}` stopped after {archived} entries at `{key}`: {source}")]
    ArchiveIncomplete {
        path: String,
        archived: usize,
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("archive error: {0}")]
    Archive(String),
}

impl BrowserError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        BrowserError::InvalidInput(msg.into())
    }
}

pub type BrowserResult<T> = Result<T, BrowserError>;

/// Shared handle passed to every request handler.
#[derive(Clone)]
pub struct BrowserService {
    /// Store every operation goes through.
    pub store: Arc<dyn ObjectStore>,

    /// Normalized base prefix; empty means the whole bucket is visible.
    pub base_prefix: String,
}

impl BrowserService {
    pub fn new(store: Arc<dyn ObjectStore>, base_prefix: impl AsRef<str>) -> Self {
        Self {
            store,
            base_prefix: super::path::normalize(base_prefix.as_ref()),
        }
    }

    /// Resolve a caller path into a full store key.
    pub fn key_for(&self, relative: &str) -> String {
        super::path::resolve(&self.base_prefix, relative)
    }

    /// Full store key (with trailing separator) for a folder.
    pub fn prefix_for(&self, relative: &str) -> String {
        super::path::folder_prefix(&self.base_prefix, relative)
    }

    /// Caller-facing path for a store key.
    pub fn relative_for<'a>(&self, key: &'a str) -> &'a str {
        super::path::strip_base(&self.base_prefix, key)
    }

    /// Normalize a required path parameter, rejecting empty input.
    pub(crate) fn required_path(&self, raw: &str, what: &str) -> BrowserResult<String> {
        let normalized = super::path::normalize(raw);
        if normalized.is_empty() {
            return Err(BrowserError::invalid(format!("missing {what}")));
        }
        Ok(normalized)
    }
}
