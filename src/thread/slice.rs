//! Per-thread visible slice: what a presenter should draw for one root.

use super::expansion::ExpansionState;
use super::forest::{Forest, ThreadNode};
use super::pager::{PagerState, paginate};
use crate::model::CommentId;

/// Expand/collapse affordance for a thread with more than one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Only the oldest reply is shown.
    Collapsed { hidden: usize },
    Expanded,
}

/// Pager bar state, present only when an expanded thread spans pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerInfo {
    pub page: usize,
    pub page_count: usize,
    pub size: usize,
}

/// A direct reply plus everything nested under it.
#[derive(Debug, Clone)]
pub struct ReplyBranch<'a> {
    pub reply: &'a ThreadNode,
    pub nested: Vec<&'a ThreadNode>,
}

#[derive(Debug, Clone)]
pub struct ThreadSlice<'a> {
    pub root: &'a ThreadNode,
    pub replies: Vec<ReplyBranch<'a>>,
    pub reply_count: usize,
    pub toggle: Option<Toggle>,
    pub pager: Option<PagerInfo>,
}

impl ThreadSlice<'_> {
    /// Ids of the visible direct replies, in display order.
    #[must_use]
    pub fn reply_ids(&self) -> Vec<CommentId> {
        self.replies.iter().map(|b| b.reply.id()).collect()
    }
}

/// Derive the visible slice for `root`.
///
/// - No replies: nothing below the root, no toggle.
/// - Exactly one reply: always shown, no toggle.
/// - Several replies, collapsed: the oldest reply and a toggle.
/// - Several replies, expanded: the requested page, a toggle, and a pager
///   when the replies do not fit on one page.
///
/// Returns `None` if `root` is not a visible root of `forest`.
#[must_use]
pub fn thread_slice<'a>(
    forest: &'a Forest,
    expansion: &ExpansionState,
    pager: &PagerState,
    root: CommentId,
) -> Option<ThreadSlice<'a>> {
    let root_node = forest.get(root).filter(|n| n.is_root() && forest.is_visible(root))?;
    let children = forest.children_of(root);
    let reply_count = children.len();

    let (visible, toggle, pager_info): (&[&ThreadNode], _, _) = match reply_count {
        0 | 1 => (children.as_slice(), None, None),
        _ if !expansion.is_expanded(root) => (
            &children[..1],
            Some(Toggle::Collapsed {
                hidden: reply_count - 1,
            }),
            None,
        ),
        _ => {
            let entry = pager.entry(root);
            let page = paginate(&children, entry.page, entry.size);
            let info = (reply_count > entry.size).then_some(PagerInfo {
                page: page.page,
                page_count: page.page_count,
                size: entry.size,
            });
            (page.items, Some(Toggle::Expanded), info)
        }
    };

    let replies = visible
        .iter()
        .map(|&reply| ReplyBranch {
            reply,
            nested: forest.descendants(reply.id()),
        })
        .collect();

    Some(ThreadSlice {
        root: root_node,
        replies,
        reply_count,
        toggle,
        pager: pager_info,
    })
}

/// Slices for every root, in root order.
#[must_use]
pub fn forest_slices<'a>(
    forest: &'a Forest,
    expansion: &ExpansionState,
    pager: &PagerState,
) -> Vec<ThreadSlice<'a>> {
    forest
        .root_ids()
        .iter()
        .filter_map(|&root| thread_slice(forest, expansion, pager, root))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommentRecord;
    use crate::thread::pager::PagerEntry;
    use chrono::{Duration, TimeZone, Utc};

    fn forest(replies: i64) -> Forest {
        let base = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let mut records = vec![CommentRecord {
            id: 1,
            author_id: 1,
            author: None,
            content: "hello".to_string(),
            created_at: base,
        }];
        for n in 0..replies {
            records.push(CommentRecord {
                id: 2 + n,
                author_id: 1,
                author: None,
                content: format!("[reply:1] r{n}"),
                created_at: base + Duration::seconds(n + 1),
            });
        }
        Forest::build(records)
    }

    #[test]
    fn single_reply_shown_without_toggle() {
        let forest = forest(1);
        let slice =
            thread_slice(&forest, &ExpansionState::new(), &PagerState::default(), 1).unwrap();
        assert_eq!(slice.reply_ids(), vec![2]);
        assert_eq!(slice.toggle, None);
    }

    #[test]
    fn collapsed_thread_shows_oldest_reply() {
        let forest = forest(2);
        let slice =
            thread_slice(&forest, &ExpansionState::new(), &PagerState::default(), 1).unwrap();
        assert_eq!(slice.reply_ids(), vec![2]);
        assert_eq!(slice.toggle, Some(Toggle::Collapsed { hidden: 1 }));
        assert_eq!(slice.pager, None);
    }

    #[test]
    fn expanded_thread_pages_replies() {
        let forest = forest(25);
        let mut expansion = ExpansionState::new();
        expansion.set_expanded(1, true);
        let mut pager = PagerState::default();
        pager.set(1, PagerEntry::new(3, 10));

        let slice = thread_slice(&forest, &expansion, &pager, 1).unwrap();

        assert_eq!(slice.reply_ids(), (22..=26).collect::<Vec<_>>());
        assert_eq!(slice.toggle, Some(Toggle::Expanded));
        assert_eq!(
            slice.pager,
            Some(PagerInfo {
                page: 3,
                page_count: 3,
                size: 10
            })
        );
    }

    #[test]
    fn expanded_thread_within_one_page_has_no_pager() {
        let forest = forest(4);
        let mut expansion = ExpansionState::new();
        expansion.set_expanded(1, true);
        let slice = thread_slice(&forest, &expansion, &PagerState::default(), 1).unwrap();
        assert_eq!(slice.reply_ids(), vec![2, 3, 4, 5]);
        assert_eq!(slice.pager, None);
    }

    #[test]
    fn non_root_has_no_slice() {
        let forest = forest(2);
        assert!(thread_slice(&forest, &ExpansionState::new(), &PagerState::default(), 2).is_none());
    }
}
