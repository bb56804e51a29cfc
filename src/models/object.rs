//! Represents an object as reported by the underlying store.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::Serialize;
use std::{fmt, io};

/// Content type written on folder marker objects.
pub const FOLDER_CONTENT_TYPE: &str = "application/x-directory";

/// Content type used when a payload carries none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Metadata for a single stored object (no payload).
///
/// Keys are full store keys, base prefix included.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// Full object key within the bucket.
    pub key: String,

    /// Size in bytes.
    pub size: u64,

    /// Timestamp when the object was last written, when the store reports one.
    pub last_modified: Option<DateTime<Utc>>,

    /// Content type (MIME type), when the store reports one on listing.
    pub content_type: Option<String>,

    /// Store-computed checksum, quotes stripped.
    pub etag: Option<String>,
}

impl StoredObject {
    /// True for zero-byte objects whose key ends in `/`.
    pub fn is_folder_marker(&self) -> bool {
        self.key.ends_with('/') && self.size == 0
    }
}

/// Listing of a single "directory" level: grouped child prefixes plus
/// objects that sit directly under the requested prefix.
#[derive(Debug, Default, Clone)]
pub struct LevelListing {
    pub common_prefixes: Vec<String>,
    pub objects: Vec<StoredObject>,
}

/// A streamed object payload.
pub struct ObjectBody {
    pub stream: BoxStream<'static, io::Result<Bytes>>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

impl ObjectBody {
    /// Drain the stream into a single buffer.
    pub async fn collect(self) -> io::Result<Bytes> {
        use futures::TryStreamExt;

        let capacity = self.content_length.unwrap_or(0) as usize;
        let buf = self
            .stream
            .try_fold(Vec::with_capacity(capacity), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok::<_, io::Error>(acc)
            })
            .await?;
        Ok(Bytes::from(buf))
    }
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
