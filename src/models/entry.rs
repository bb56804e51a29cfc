//! Virtual filesystem entries handed back to callers.
//!
//! Folders are synthetic: they come either from a common-prefix grouping or
//! from a folder marker object, and may have no stored object of their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminator used by requests that act on a path (delete, download).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    File,
    Folder,
}

/// One row of a folder listing.
///
/// `full_path` is relative to the configured base prefix and never carries a
/// leading or trailing separator.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VirtualEntry {
    #[serde(rename_all = "camelCase")]
    File {
        name: String,
        full_path: String,
        size: u64,
        last_modified: Option<DateTime<Utc>>,
    },
    #[serde(rename_all = "camelCase")]
    Folder { name: String, full_path: String },
}

impl VirtualEntry {
    pub fn name(&self) -> &str {
        match self {
            VirtualEntry::File { name, .. } | VirtualEntry::Folder { name, .. } => name,
        }
    }

    pub fn full_path(&self) -> &str {
        match self {
            VirtualEntry::File { full_path, .. } | VirtualEntry::Folder { full_path, .. } => {
                full_path
            }
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            VirtualEntry::File { .. } => EntryKind::File,
            VirtualEntry::Folder { .. } => EntryKind::Folder,
        }
    }

    /// Folders report no size.
    pub fn size(&self) -> Option<u64> {
        match self {
            VirtualEntry::File { size, .. } => Some(*size),
            VirtualEntry::Folder { .. } => None,
        }
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        match self {
            VirtualEntry::File { last_modified, .. } => *last_modified,
            VirtualEntry::Folder { .. } => None,
        }
    }
}

/// A single navigation step from the root to the current folder.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Breadcrumb {
    pub name: String,
    pub path: String,
}

/// Result of listing one folder level.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub items: Vec<VirtualEntry>,
    pub current_path: String,
    pub breadcrumbs: Vec<Breadcrumb>,
}
