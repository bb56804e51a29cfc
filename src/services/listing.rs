//! One-level folder listing with folder discovery and breadcrumbs.

use super::{
    browser::{BrowserResult, BrowserService},
    path,
};
use crate::models::{
    entry::{Breadcrumb, Listing, VirtualEntry},
    object::LevelListing,
};
use tracing::{debug, error};

/// Root breadcrumb label.
pub const HOME: &str = "Home";

impl BrowserService {
    /// List the direct children of `folder`.
    ///
    /// Child folders come from common prefixes (structural or marker-backed),
    /// files from direct objects. The queried folder's own marker is
    /// suppressed. Entries keep store order.
    pub async fn list(&self, folder: &str) -> BrowserResult<Listing> {
        let current_path = path::normalize(folder);
        let full_prefix = self.prefix_for(&current_path);
        debug!(prefix = %full_prefix, "listing folder level");

        let level = self
            .store
            .list_one_level(&full_prefix, "/")
            .await
            .inspect_err(|err| error!(prefix = %full_prefix, "listing failed: {err}"))?;

        Ok(Listing {
            items: self.materialize(&full_prefix, level),
            breadcrumbs: breadcrumbs(&current_path),
            current_path,
        })
    }

    fn materialize(&self, full_prefix: &str, level: LevelListing) -> Vec<VirtualEntry> {
        let folders = level.common_prefixes.into_iter().map(|prefix| {
            let relative = self.relative_for(&prefix);
            VirtualEntry::Folder {
                name: path::last_segment(&prefix).to_string(),
                full_path: relative.trim_end_matches('/').to_string(),
            }
        });

        let files = level
            .objects
            .into_iter()
            .filter(|object| !object.key.is_empty() && object.key != full_prefix)
            .map(|object| VirtualEntry::File {
                name: path::last_segment(&object.key).to_string(),
                full_path: self.relative_for(&object.key).to_string(),
                size: object.size,
                last_modified: object.last_modified,
            });

        folders.chain(files).collect()
    }
}

/// Breadcrumb trail from the root to `current`, root first.
pub fn breadcrumbs(current: &str) -> Vec<Breadcrumb> {
    let mut trail = vec![Breadcrumb {
        name: HOME.to_string(),
        path: String::new(),
    }];
    let mut so_far = String::new();
    for segment in path::segments(current) {
        if !so_far.is_empty() {
            so_far.push('/');
        }
        so_far.push_str(segment);
        trail.push(Breadcrumb {
            name: segment.to_string(),
            path: so_far.clone(),
        });
    }
    trail
}
