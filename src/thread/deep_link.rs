//! Deep-link resolution: make a target comment visible.

use tracing::debug;

use super::expansion::{ExpansionState, normalize_to_root};
use super::forest::Forest;
use super::pager::{PagerEntry, PagerState};
use crate::model::CommentId;

/// Where a resolved target lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeepLink {
    pub root_id: CommentId,
    pub target_id: CommentId,
    /// Page of the root's replies that holds the target. For the root
    /// itself, or a target nested below a direct reply, this is the page
    /// already requested for the thread.
    pub page: usize,
    pub size: usize,
}

/// Resolve `target` against `forest`, expanding its thread and moving the
/// thread's pager to the page containing it.
///
/// Returns `None` and changes nothing when `target` is not visible in the
/// forest. Resolving the same target twice against the same forest yields
/// the same result.
pub fn resolve(
    forest: &Forest,
    expansion: &mut ExpansionState,
    pager: &mut PagerState,
    target: CommentId,
) -> Option<DeepLink> {
    if !forest.is_visible(target) {
        debug!(comment_id = target, "deep link target not in current comments");
        return None;
    }
    let root_id = normalize_to_root(forest, target)?;
    expansion.set_expanded(root_id, true);

    let size = pager.size_for(root_id);
    let index = if target == root_id {
        None
    } else {
        forest
            .child_ids(root_id)
            .iter()
            .position(|&id| id == target)
    };

    let page = match index {
        Some(index) => {
            let page = index / size + 1;
            pager.set(root_id, PagerEntry::new(page, size));
            page
        }
        None => pager.entry(root_id).page,
    };

    Some(DeepLink {
        root_id,
        target_id: target,
        page,
        size,
    })
}
