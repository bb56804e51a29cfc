//! Upload key resolution and the file write itself.

use super::{
    browser::{BrowserError, BrowserResult, BrowserService},
    path,
};
use crate::models::object::DEFAULT_CONTENT_TYPE;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

/// A single file handed over by the client.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Folder the user is browsing, relative to the base prefix.
    pub current_path: String,
    /// File name as reported by the client.
    pub file_name: String,
    /// Nested path reported by a folder picker, e.g. `album/2024/a.jpg`.
    pub relative_path: Option<String>,
    /// Use `relative_path` instead of `file_name` when present.
    pub preserve_path: bool,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    /// Full store key the file was written to.
    pub key: String,
    /// Path of the file relative to the base prefix.
    pub path: String,
    pub size: u64,
    /// Folder markers written on the way.
    pub markers: Vec<String>,
}

impl BrowserService {
    /// Relative destination path for an upload (base prefix not applied).
    pub fn resolve_upload_path(
        &self,
        current_path: &str,
        file_name: &str,
        relative_path: Option<&str>,
        preserve_path: bool,
    ) -> BrowserResult<String> {
        let hint = relative_path
            .filter(|_| preserve_path)
            .map(|hint| path::normalize(hint.trim()))
            .filter(|hint| !hint.is_empty());

        let chain = match hint {
            Some(hint) => hint,
            None => path::last_segment(file_name).to_string(),
        };
        if chain.is_empty() {
            return Err(BrowserError::invalid("missing file"));
        }

        Ok(path::join(current_path, &chain))
    }

    /// Full store key for an upload, see [`Self::resolve_upload_path`].
    pub fn resolve_upload_key(
        &self,
        current_path: &str,
        file_name: &str,
        relative_path: Option<&str>,
        preserve_path: bool,
    ) -> BrowserResult<String> {
        let relative =
            self.resolve_upload_path(current_path, file_name, relative_path, preserve_path)?;
        Ok(self.key_for(&relative))
    }

    /// Write one uploaded file.
    ///
    /// Ancestor folder markers go first and are best-effort; the upload
    /// succeeds whenever the file write itself does.
    pub async fn upload(&self, req: UploadRequest) -> BrowserResult<UploadOutcome> {
        let relative = self.resolve_upload_path(
            &req.current_path,
            &req.file_name,
            req.relative_path.as_deref(),
            req.preserve_path,
        )?;
        let key = self.key_for(&relative);

        let markers = self.ensure_ancestor_markers(&relative).await;

        let content_type = req
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        let size = req.body.len() as u64;
        self.store.put(&key, req.body, content_type).await?;

        info!(key = %key, size, content_type, "uploaded file");
        Ok(UploadOutcome {
            key,
            path: relative,
            size,
            markers,
        })
    }
}
