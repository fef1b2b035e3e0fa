//! Presentation seam.
//!
//! The session hands a [`ThreadView`] to a [`ThreadPresenter`] after every
//! reload; [`TextPresenter`] is the plain-text implementation used by the
//! line client.

mod thread_text;

pub use thread_text::TextPresenter;

use crate::model::{CommentId, EntityRef};
use crate::thread::{Forest, ThreadSlice};

/// Everything a presenter needs to draw one entity's comments.
#[derive(Debug)]
pub struct ThreadView<'a> {
    pub entity: EntityRef,
    pub forest: &'a Forest,
    /// One slice per visible root, oldest first.
    pub threads: Vec<ThreadSlice<'a>>,
    /// Comment to mark in this render only (edited or deep-linked).
    pub highlight: Option<CommentId>,
}

impl ThreadView<'_> {
    /// Author label of `id`'s parent, for reply arrows.
    #[must_use]
    pub fn parent_label(&self, id: CommentId) -> Option<String> {
        let parent = self.forest.get(id)?.reply_to?;
        self.forest.get(parent).map(|p| p.record.author_label())
    }
}

pub trait ThreadPresenter {
    fn present(&mut self, view: &ThreadView<'_>);

    /// The list fetch failed; the previous view stays valid.
    fn load_failed(&mut self, message: &str);
}
