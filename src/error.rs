//! Error types for the comment client.

use crate::model::CommentId;

/// Failures reported by a [`CommentStore`](crate::store::CommentStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Listing comments failed; the caller keeps its previous view.
    #[error("failed to fetch comments: {0}")]
    Fetch(String),

    /// Create/update/delete was rejected.
    #[error("comment update rejected: {0}")]
    Mutation(String),

    #[error("comment {0} not found")]
    NotFound(CommentId),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid comment payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of a user action, surfaced where the action was taken.
///
/// None of these trigger a reload, so any unsaved input stays in place.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("comment body is empty")]
    EmptyContent,

    #[error("comment {0} is not in the current view")]
    UnknownComment(CommentId),

    #[error("comments have not been loaded yet")]
    NotLoaded,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A line that does not parse as a client command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}`; type `h` for help")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("not a comment locator: {0}")]
    BadLocator(String),
}
