//! Path resolution between caller-facing relative paths and store keys.
//!
//! Every key the browser emits is `base + "/" + relative` with separators
//! collapsed. Backslashes from client input count as separators so no key
//! ever carries one. Pure functions only.

pub const SEPARATOR: char = '/';

/// Collapse separator runs and trim leading/trailing separators.
pub fn normalize(path: &str) -> String {
    segments(path).collect::<Vec<_>>().join("/")
}

/// Non-empty segments of a path, in order.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty())
}

/// Join two relative paths with exactly one separator.
pub fn join(left: &str, right: &str) -> String {
    normalize(&format!("{left}/{right}"))
}

/// Resolve a relative path against the base prefix into a store key.
///
/// The result has no trailing separator; callers that need a folder prefix
/// use [`folder_prefix`].
pub fn resolve(base: &str, relative: &str) -> String {
    join(base, relative)
}

/// Inverse of [`resolve`]: drop `base + "/"` from the front of `key`.
///
/// Keys outside the base are returned unchanged.
pub fn strip_base<'a>(base: &str, key: &'a str) -> &'a str {
    if base.is_empty() {
        return key;
    }
    key.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
        .unwrap_or(key)
}

/// Resolved folder key with a trailing separator, or `""` when both the base
/// and the folder are empty (the whole bucket).
pub fn folder_prefix(base: &str, relative: &str) -> String {
    let resolved = resolve(base, relative);
    if resolved.is_empty() {
        resolved
    } else {
        format!("{resolved}/")
    }
}

/// Last non-empty segment, or `""` for the root.
pub fn last_segment(path: &str) -> &str {
    segments(path).last().unwrap_or("")
}

/// Normalized parent of a relative path; `None` for top-level entries.
pub fn parent(path: &str) -> Option<String> {
    let normalized = normalize(path);
    normalized
        .rsplit_once(SEPARATOR)
        .map(|(parent, _)| parent.to_string())
}

/// Every proper ancestor folder of `path`, shallowest first.
///
/// `"a/b/c.txt"` yields `["a", "a/b"]`; the root itself is never included.
pub fn ancestors(path: &str) -> Vec<String> {
    let parts: Vec<&str> = segments(path).collect();
    (1..parts.len()).map(|depth| parts[..depth].join("/")).collect()
}
