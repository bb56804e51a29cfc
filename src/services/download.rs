//! Downloads: a single object streamed straight through, or a whole folder
//! packed into a zip archive in memory.

use super::{
    browser::{BrowserError, BrowserResult, BrowserService},
    path,
};
use crate::{
    models::{
        entry::EntryKind,
        object::{DEFAULT_CONTENT_TYPE, ObjectBody},
    },
    store::StoreError,
};
use bytes::Bytes;
use std::io::{Cursor, Write};
use tracing::{debug, error, info, warn};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

pub const ZIP_CONTENT_TYPE: &str = "application/zip";

pub enum DownloadBody {
    /// Passed through from the store as it arrives.
    Stream(ObjectBody),
    /// Fully assembled in memory.
    Buffer(Bytes),
}

pub struct Download {
    /// Suggested name for `Content-Disposition`.
    pub filename: String,
    pub content_type: String,
    pub body: DownloadBody,
}

impl Download {
    pub fn content_length(&self) -> Option<u64> {
        match &self.body {
            DownloadBody::Stream(body) => body.content_length,
            DownloadBody::Buffer(bytes) => Some(bytes.len() as u64),
        }
    }

    /// Buffer the whole payload.
    pub async fn into_bytes(self) -> Result<Bytes, StoreError> {
        match self.body {
            DownloadBody::Stream(body) => Ok(body.collect().await?),
            DownloadBody::Buffer(bytes) => Ok(bytes),
        }
    }
}

impl BrowserService {
    /// Download a file, or a folder as `<folderName>.zip`.
    pub async fn download(&self, relative: &str, kind: EntryKind) -> BrowserResult<Download> {
        let relative = self.required_path(relative, "path")?;
        match kind {
            EntryKind::File => self.download_file(&relative).await,
            EntryKind::Folder => self.download_folder(&relative).await,
        }
    }

    async fn download_file(&self, relative: &str) -> BrowserResult<Download> {
        let key = self.key_for(relative);
        let body = self.store.get(&key).await.map_err(|err| match err {
            StoreError::NotFound { .. } => BrowserError::NotFound(relative.to_string()),
            other => BrowserError::Store(other),
        })?;

        let content_type = body
            .content_type
            .clone()
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        debug!(key = %key, content_type = %content_type, "streaming file");

        Ok(Download {
            filename: path::last_segment(relative).to_string(),
            content_type,
            body: DownloadBody::Stream(body),
        })
    }

    async fn download_folder(&self, relative: &str) -> BrowserResult<Download> {
        let prefix = self.prefix_for(relative);
        let objects = self.store.list_all(&prefix).await?;
        if objects.is_empty() {
            return Err(BrowserError::NotFound(relative.to_string()));
        }

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644)
            .large_file(true);
        let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
        let mut archived = 0;

        for object in objects {
            let Some(relative_key) = object.key.strip_prefix(&prefix) else {
                continue;
            };
            if relative_key.is_empty() {
                // the folder's own marker
                continue;
            }
            let Some(entry_name) = archive_entry_name(relative_key) else {
                warn!(key = %object.key, "skipping key that would extract outside the archive root");
                continue;
            };

            if object.is_folder_marker() {
                archive.add_directory(entry_name, options).map_err(archive_error)?;
                archived += 1;
                continue;
            }

            let contents = match self.fetch_all(&object.key).await {
                Ok(contents) => contents,
                Err(source) => {
                    error!(prefix = %prefix, key = %object.key, archived, "folder archive aborted: {source}");
                    return Err(BrowserError::ArchiveIncomplete {
                        path: relative.to_string(),
                        archived,
                        key: object.key.clone(),
                        source,
                    });
                }
            };

            archive.start_file(entry_name, options).map_err(archive_error)?;
            archive.write_all(&contents).map_err(archive_error)?;
            archived += 1;
            debug!(entry = entry_name, size = contents.len(), "archived object");
        }

        let buffer = archive.finish().map_err(archive_error)?.into_inner();
        info!(prefix = %prefix, entries = archived, bytes = buffer.len(), "built folder archive");

        Ok(Download {
            filename: format!("{}.zip", path::last_segment(relative)),
            content_type: ZIP_CONTENT_TYPE.to_string(),
            body: DownloadBody::Buffer(Bytes::from(buffer)),
        })
    }

    async fn fetch_all(&self, key: &str) -> Result<Bytes, StoreError> {
        let body = self.store.get(key).await?;
        Ok(body.collect().await?)
    }
}

/// Entry name for a key below the archived folder, or `None` when the key
/// has empty, `.` or `..` segments or a backslash.
fn archive_entry_name(relative_key: &str) -> Option<&str> {
    let trimmed = relative_key.strip_suffix('/').unwrap_or(relative_key);
    let safe = !trimmed.is_empty()
        && trimmed
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | "..") && !segment.contains('\\'));
    safe.then_some(relative_key)
}

fn archive_error(err: impl std::fmt::Display) -> BrowserError {
    BrowserError::Archive(err.to_string())
}
