//! Message types for the Elm Architecture

use crate::model::CommentId;

/// All user actions the line client can issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // === Threads ===
    /// Expand or collapse the thread containing a comment
    Toggle(CommentId),
    /// Show a page of a root's replies
    ChangePage { root: CommentId, page: usize },
    /// Deep-link to a comment
    GoTo(CommentId),

    // === Mutations ===
    /// Post a top-level comment
    Create(String),
    Reply { parent: CommentId, body: String },
    Edit { id: CommentId, body: String },
    Delete(CommentId),

    // === System ===
    /// Refetch and redraw
    Reload,
    Help,
    Quit,
}
