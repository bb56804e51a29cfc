//! Folder markers: zero-byte objects whose key ends in `/`.
//!
//! A marker makes an otherwise empty prefix show up in listings. Puts
//! overwrite, so writing a marker twice is harmless.

use super::{
    browser::{BrowserError, BrowserResult, BrowserService},
    path,
};
use crate::models::object::FOLDER_CONTENT_TYPE;
use bytes::Bytes;
use tracing::{debug, info, warn};

impl BrowserService {
    /// Create `folder_name` under `parent`, plus markers for every ancestor
    /// level so each intermediate folder is listable on its own.
    ///
    /// Returns the marker key. Only the new folder's own marker failing is an
    /// error; ancestor marker failures are logged.
    pub async fn create_folder(&self, parent: &str, folder_name: &str) -> BrowserResult<String> {
        let name = path::normalize(folder_name.trim());
        if name.is_empty() {
            return Err(BrowserError::invalid("missing folder name"));
        }
        let relative = path::join(parent, &name);

        self.ensure_ancestor_markers(&relative).await;
        let marker = self.write_marker(&relative).await?;
        info!(marker = %marker, "created folder");
        Ok(marker)
    }

    /// Write the marker for a single folder path and return its key.
    pub(crate) async fn write_marker(&self, folder: &str) -> BrowserResult<String> {
        let marker = self.prefix_for(folder);
        if marker.is_empty() || marker == self.prefix_for("") {
            return Err(BrowserError::invalid("cannot create a marker for the root"));
        }
        self.store
            .put(&marker, Bytes::new(), FOLDER_CONTENT_TYPE)
            .await?;
        Ok(marker)
    }

    /// Best-effort markers for every proper ancestor of `relative`.
    ///
    /// Returns the markers that were written.
    pub(crate) async fn ensure_ancestor_markers(&self, relative: &str) -> Vec<String> {
        let mut written = Vec::new();
        for ancestor in path::ancestors(relative) {
            match self.write_marker(&ancestor).await {
                Ok(marker) => {
                    debug!(marker = %marker, "wrote ancestor marker");
                    written.push(marker);
                }
                Err(err) => warn!(folder = %ancestor, "could not write folder marker: {err}"),
            }
        }
        written
    }
}
