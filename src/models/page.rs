//! Sorting and pagination applied on top of a raw folder listing.
//!
//! The listing engine returns entries in store order; these helpers are the
//! presentation policy the HTTP layer offers on top of it.

use crate::models::entry::VirtualEntry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How many page numbers a pagination window shows at most.
pub const PAGE_WINDOW_ITEMS: usize = 5;

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    LastModified,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Sort entries in place, folders before files regardless of direction.
pub fn sort_entries(entries: &mut [VirtualEntry], key: SortKey, order: SortOrder) {
    entries.sort_by(|a, b| {
        let by_kind = folder_rank(a).cmp(&folder_rank(b));
        if by_kind != Ordering::Equal {
            return by_kind;
        }
        let ord = match key {
            SortKey::Name => a.name().cmp(b.name()),
            SortKey::Size => a.size().cmp(&b.size()),
            SortKey::LastModified => a.last_modified().cmp(&b.last_modified()),
        }
        .then_with(|| a.name().cmp(b.name()));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

fn folder_rank(entry: &VirtualEntry) -> u8 {
    match entry {
        VirtualEntry::Folder { .. } => 0,
        VirtualEntry::File { .. } => 1,
    }
}

/// Page numbers to render around the current page.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub pages: Vec<usize>,
    pub show_left_ellipsis: bool,
    pub show_right_ellipsis: bool,
}

/// Compute a window of at most `items` page numbers (1-based) centred on
/// `current`, clamped to `1..=total`.
pub fn page_window(current: usize, total: usize, items: usize) -> PageWindow {
    let pages: Vec<usize> = if total <= items {
        (1..=total).collect()
    } else {
        let half = items / 2;
        let mut start = current.saturating_sub(half).max(1);
        let mut end = (start + items - 1).min(total);
        if end == total {
            start = (end + 1).saturating_sub(items).max(1);
        }
        if start == 1 {
            end = items.min(total);
        }
        (start..=end).collect()
    };

    let show_left_ellipsis = pages.first().is_some_and(|first| *first > 1);
    let show_right_ellipsis = pages.last().is_some_and(|last| *last < total);

    PageWindow {
        pages,
        show_left_ellipsis,
        show_right_ellipsis,
    }
}

/// One page of entries plus navigation metadata.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub window: PageWindow,
}

/// Slice `entries` down to the requested 1-based page.
///
/// A page past the end is clamped to the last page; an empty listing still
/// reports a single (empty) page.
pub fn paginate(entries: Vec<VirtualEntry>, page: usize, page_size: usize) -> (Vec<VirtualEntry>, Page) {
    let page_size = page_size.max(1);
    let total_items = entries.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let items = entries
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    let meta = Page {
        page,
        page_size,
        total_items,
        total_pages,
        window: page_window(page, total_pages, PAGE_WINDOW_ITEMS),
    };
    (items, meta)
}
