//! Reply forest reconstruction.
//!
//! Records arrive as a flat, unordered list. Parenthood is read once from the
//! content prefix and kept as a structural `reply_to` field; nothing past this
//! module looks at the prefix again.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::reply::extract_parent;
use crate::model::{CommentId, CommentRecord};

/// Hard ceiling on parent-chain walks. Parent links come from the server
/// unvalidated, so every upward walk stops here or on a revisit.
pub const MAX_DEPTH: usize = 32;

/// A comment with its resolved parent and prefix-free content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadNode {
    pub record: CommentRecord,
    pub reply_to: Option<CommentId>,
    pub display_content: String,
}

impl ThreadNode {
    fn from_record(record: CommentRecord) -> Self {
        let parsed = extract_parent(&record.content);
        let reply_to = parsed.parent_id;
        let display_content = parsed.display_content.to_string();
        Self {
            record,
            reply_to,
            display_content,
        }
    }

    #[must_use]
    pub const fn id(&self) -> CommentId {
        self.record.id
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.record.created_at
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.reply_to.is_none()
    }
}

/// All threads for one entity.
///
/// Every record is addressable by id, but only nodes whose parent chain ends
/// at a root are visible. Orphans (replies to ids missing from the fetch),
/// their descendants, and members of reference cycles are never listed as
/// roots or as anyone's children.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: HashMap<CommentId, ThreadNode>,
    children: HashMap<CommentId, Vec<CommentId>>,
    roots: Vec<CommentId>,
    root_by_node: HashMap<CommentId, CommentId>,
    orphans: usize,
}

impl Forest {
    /// Build a forest from one fetch worth of records.
    ///
    /// Roots and every child list are sorted by `created_at` ascending; ties
    /// keep input order.
    #[must_use]
    pub fn build(records: impl IntoIterator<Item = CommentRecord>) -> Self {
        let mut nodes: HashMap<CommentId, ThreadNode> = HashMap::new();
        let mut order: Vec<CommentId> = Vec::new();

        for record in records {
            let id = record.id;
            if nodes.contains_key(&id) {
                debug!(comment_id = id, "duplicate comment id in fetch; keeping first");
                continue;
            }
            nodes.insert(id, ThreadNode::from_record(record));
            order.push(id);
        }

        let mut children: HashMap<CommentId, Vec<CommentId>> = HashMap::new();
        let mut roots = Vec::new();
        let mut orphans = 0usize;

        for id in order {
            let Some(node) = nodes.get(&id) else {
                continue;
            };
            match node.reply_to {
                None => roots.push(id),
                Some(parent) if nodes.contains_key(&parent) => {
                    children.entry(parent).or_default().push(id);
                }
                Some(parent) => {
                    orphans += 1;
                    debug!(
                        comment_id = id,
                        parent_id = parent,
                        "reply references a missing comment; hidden"
                    );
                }
            }
        }

        let by_created = |a: &CommentId, b: &CommentId| {
            let left = nodes.get(a).map(ThreadNode::created_at);
            let right = nodes.get(b).map(ThreadNode::created_at);
            left.cmp(&right)
        };
        roots.sort_by(by_created);
        for list in children.values_mut() {
            list.sort_by(by_created);
        }

        let root_by_node = roots_by_reachability(&roots, &children);
        let hidden = nodes.len() - root_by_node.len();
        if hidden > orphans {
            debug!(
                count = hidden - orphans,
                "comments unreachable from any root (cycle or orphaned branch)"
            );
        }

        Self {
            nodes,
            children,
            roots,
            root_by_node,
            orphans,
        }
    }

    #[must_use]
    pub fn get(&self, id: CommentId) -> Option<&ThreadNode> {
        self.nodes.get(&id)
    }

    /// Whether `id` is part of some rendered thread.
    #[must_use]
    pub fn is_visible(&self, id: CommentId) -> bool {
        self.root_by_node.contains_key(&id)
    }

    #[must_use]
    pub fn root_ids(&self) -> &[CommentId] {
        &self.roots
    }

    pub fn roots(&self) -> impl Iterator<Item = &ThreadNode> {
        self.roots.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Sorted ids of the direct replies to `id`.
    #[must_use]
    pub fn child_ids(&self, id: CommentId) -> &[CommentId] {
        if !self.is_visible(id) {
            return &[];
        }
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Sorted direct replies to `id`.
    #[must_use]
    pub fn children_of(&self, id: CommentId) -> Vec<&ThreadNode> {
        self.child_ids(id)
            .iter()
            .filter_map(|child| self.nodes.get(child))
            .collect()
    }

    /// All replies below `id`, depth-first, each level in `created_at` order.
    #[must_use]
    pub fn descendants(&self, id: CommentId) -> Vec<&ThreadNode> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut stack: Vec<CommentId> = self.child_ids(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            if let Some(node) = self.nodes.get(&next) {
                out.push(node);
            }
            stack.extend(self.child_ids(next).iter().rev().copied());
        }
        out
    }

    /// Number of parent hops above `id`.
    ///
    /// Stops on a revisited node or after [`MAX_DEPTH`] hops and returns the
    /// count reached so far. A hop onto a missing parent still counts.
    #[must_use]
    pub fn depth_of(&self, id: CommentId) -> usize {
        let mut depth = 0usize;
        let mut seen = HashSet::new();
        let mut current = self.nodes.get(&id);
        while let Some(node) = current {
            let Some(parent) = node.reply_to else {
                break;
            };
            if !seen.insert(node.id()) {
                debug!(comment_id = id, depth, "reply cycle detected");
                break;
            }
            if depth >= MAX_DEPTH {
                debug!(comment_id = id, depth, "reply chain exceeds depth budget");
                break;
            }
            depth += 1;
            current = self.nodes.get(&parent);
        }
        depth
    }

    /// The root of the thread containing `id`.
    ///
    /// Defined exactly for visible nodes, at any depth. Returns `None` when
    /// `id` is unknown or its chain never reaches a root (orphaned or cyclic).
    #[must_use]
    pub fn root_of(&self, id: CommentId) -> Option<CommentId> {
        self.root_by_node.get(&id).copied()
    }

    /// Total records, including hidden ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Replies whose parent id was not in the fetch.
    #[must_use]
    pub const fn orphan_count(&self) -> usize {
        self.orphans
    }
}

/// Map every node reachable from a root to that root.
fn roots_by_reachability(
    roots: &[CommentId],
    children: &HashMap<CommentId, Vec<CommentId>>,
) -> HashMap<CommentId, CommentId> {
    let mut root_by_node: HashMap<CommentId, CommentId> = HashMap::new();
    let mut queue: VecDeque<(CommentId, CommentId)> =
        roots.iter().map(|&root| (root, root)).collect();
    while let Some((id, root)) = queue.pop_front() {
        if root_by_node.contains_key(&id) {
            continue;
        }
        root_by_node.insert(id, root);
        if let Some(kids) = children.get(&id) {
            queue.extend(kids.iter().map(|&kid| (kid, root)));
        }
    }
    root_by_node
}
