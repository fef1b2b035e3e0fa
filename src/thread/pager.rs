//! Reply pagination.

use std::collections::HashMap;

use crate::model::CommentId;

/// Replies per page when a thread has no stored size.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of a child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page actually shown after clamping.
    pub page: usize,
    pub page_count: usize,
}

/// Number of pages for `len` items, never less than one.
#[must_use]
pub const fn page_count(len: usize, size: usize) -> usize {
    let size = if size == 0 { 1 } else { size };
    let count = len.div_ceil(size);
    if count == 0 { 1 } else { count }
}

/// Slice `children` to the requested 1-based page.
///
/// `page` is clamped into `1..=page_count`. A zero `size` is treated as one.
#[must_use]
pub fn paginate<T>(children: &[T], page: usize, size: usize) -> Page<'_, T> {
    let size = size.max(1);
    let page_count = page_count(children.len(), size);
    let page = page.clamp(1, page_count);
    let start = ((page - 1) * size).min(children.len());
    let end = (page * size).min(children.len());
    Page {
        items: &children[start..end],
        page,
        page_count,
    }
}

/// Requested page for one thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerEntry {
    pub page: usize,
    pub size: usize,
}

impl PagerEntry {
    #[must_use]
    pub const fn new(page: usize, size: usize) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            size: if size == 0 { 1 } else { size },
        }
    }
}

/// Per-thread page requests, keyed by root comment id.
///
/// Survives reloads. Pages are clamped against the current child count when
/// read, and written back clamped after each successful reload.
#[derive(Debug, Clone)]
pub struct PagerState {
    entries: HashMap<CommentId, PagerEntry>,
    default_size: usize,
}

impl Default for PagerState {
    fn default() -> Self {
        Self::with_default_size(DEFAULT_PAGE_SIZE)
    }
}

impl PagerState {
    #[must_use]
    pub fn with_default_size(default_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            default_size: default_size.max(1),
        }
    }

    #[must_use]
    pub const fn default_size(&self) -> usize {
        self.default_size
    }

    /// Stored entry for `root`, or page 1 at the default size.
    #[must_use]
    pub fn entry(&self, root: CommentId) -> PagerEntry {
        self.entries
            .get(&root)
            .copied()
            .unwrap_or_else(|| PagerEntry::new(1, self.default_size))
    }

    /// Page size for `root`, keeping any size already chosen for it.
    #[must_use]
    pub fn size_for(&self, root: CommentId) -> usize {
        self.entry(root).size
    }

    pub fn set_page(&mut self, root: CommentId, page: usize) {
        let size = self.size_for(root);
        self.entries.insert(root, PagerEntry::new(page, size));
    }

    pub fn set(&mut self, root: CommentId, entry: PagerEntry) {
        self.entries.insert(root, entry);
    }

    /// Clamp every stored page against its thread's current reply count.
    ///
    /// `child_count` returns `None` for threads that no longer exist; their
    /// entries are left alone in case the thread comes back.
    pub fn clamp_all(&mut self, child_count: impl Fn(CommentId) -> Option<usize>) {
        for (root, entry) in &mut self.entries {
            if let Some(len) = child_count(*root) {
                entry.page = entry.page.clamp(1, page_count(len, entry.size));
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
