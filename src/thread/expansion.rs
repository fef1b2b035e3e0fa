//! Which threads the user has expanded.

use std::collections::HashMap;

use super::forest::Forest;
use crate::model::CommentId;

/// Expanded/collapsed flag per thread, keyed by root comment id.
///
/// Keys must be root ids. Callers normalize with [`normalize_to_root`] before
/// calling [`ExpansionState::set_expanded`]; the store does not correct a
/// non-root key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashMap<CommentId, bool>,
}

impl ExpansionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_expanded(&self, root: CommentId) -> bool {
        self.expanded.get(&root).copied().unwrap_or(false)
    }

    pub fn set_expanded(&mut self, root: CommentId, value: bool) {
        self.expanded.insert(root, value);
    }

    /// Flip the flag for `root` and return the new value.
    pub fn toggle(&mut self, root: CommentId) -> bool {
        let next = !self.is_expanded(root);
        self.set_expanded(root, next);
        next
    }
}

/// Walk from any comment to the root of its thread.
///
/// Defined for every visible comment regardless of depth. Returns `None` if
/// `id` is unknown or not under a real root.
#[must_use]
pub fn normalize_to_root(forest: &Forest, id: CommentId) -> Option<CommentId> {
    forest.root_of(id)
}
