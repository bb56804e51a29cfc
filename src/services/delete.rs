//! Recursive delete: single objects, or every object under a folder prefix
//! in store-sized batches.
//!
//! Batches go out one after another. The first failing batch stops the run
//! and nothing already deleted is restored.

use super::browser::{BrowserError, BrowserResult, BrowserService};
use crate::{models::entry::EntryKind, store::MAX_DELETE_BATCH};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// What a successful delete removed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Objects removed, folder markers included.
    pub deleted: usize,
    /// Store requests issued.
    pub batches: usize,
}

/// One selection in a bulk delete.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteItem {
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
}

/// Per-item result of a bulk delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItemOutcome {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BrowserService {
    /// Delete a file, or a folder and everything under it.
    pub async fn delete(&self, relative: &str, kind: EntryKind) -> BrowserResult<DeleteReport> {
        let relative = self.required_path(relative, "path")?;
        match kind {
            EntryKind::File => self.delete_file(relative).await,
            EntryKind::Folder => self.delete_folder(relative).await,
        }
    }

    async fn delete_file(&self, relative: String) -> BrowserResult<DeleteReport> {
        let key = self.key_for(&relative);
        self.store.delete_one(&key).await?;
        info!(key = %key, "deleted file");
        Ok(DeleteReport {
            path: relative,
            kind: EntryKind::File,
            deleted: 1,
            batches: 1,
        })
    }

    async fn delete_folder(&self, relative: String) -> BrowserResult<DeleteReport> {
        let prefix = self.prefix_for(&relative);
        let keys: Vec<String> = self
            .store
            .list_all(&prefix)
            .await?
            .into_iter()
            .map(|object| object.key)
            .collect();
        if keys.is_empty() {
            return Err(BrowserError::NotFound(relative));
        }

        let total = keys.len();
        let mut deleted = 0;
        let mut batches = 0;
        for batch in keys.chunks(MAX_DELETE_BATCH) {
            batches += 1;
            debug!(prefix = %prefix, batch = batches, size = batch.len(), "deleting batch");
            if let Err(source) = self.store.delete_many(batch).await {
                error!(
                    prefix = %prefix,
                    deleted,
                    remaining = total - deleted,
                    "folder delete aborted: {source}"
                );
                return Err(BrowserError::PartialDelete {
                    path: relative,
                    deleted,
                    remaining: total - deleted,
                    source,
                });
            }
            deleted += batch.len();
        }

        info!(prefix = %prefix, deleted, batches, "deleted folder");
        Ok(DeleteReport {
            path: relative,
            kind: EntryKind::Folder,
            deleted,
            batches,
        })
    }

    /// Run independent deletes one after another.
    ///
    /// Each selection is its own request: a failure is recorded and the next
    /// item still runs.
    pub async fn delete_each(&self, items: Vec<DeleteItem>) -> Vec<DeleteItemOutcome> {
        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let outcome = match self.delete(&item.path, item.kind).await {
                Ok(report) => DeleteItemOutcome {
                    path: report.path,
                    kind: item.kind,
                    ok: true,
                    deleted: Some(report.deleted),
                    error: None,
                },
                Err(err) => DeleteItemOutcome {
                    path: item.path,
                    kind: item.kind,
                    ok: false,
                    deleted: None,
                    error: Some(err.to_string()),
                },
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}
