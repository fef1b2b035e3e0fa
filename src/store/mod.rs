//! Comment storage collaborator.
//!
//! The server owns storage; the client only lists, creates, updates and
//! deletes whole records through [`CommentStore`].

pub mod http;
pub mod sqlite;

use std::rc::Rc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{CommentId, CommentRecord, EntityRef};

pub use http::HttpStore;
pub use sqlite::SqliteStore;

/// A comment to be created. `content` may already carry a reply prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub entity: EntityRef,
    pub content: String,
}

/// Access to the comments of one or more entities.
///
/// Single-threaded: implementations may hold `!Send` handles.
#[async_trait(?Send)]
pub trait CommentStore {
    /// All live comments for `entity`, in no particular order.
    async fn list(&self, entity: EntityRef) -> Result<Vec<CommentRecord>, StoreError>;

    /// Create a comment and return its id.
    async fn create(&self, comment: &NewComment) -> Result<CommentId, StoreError>;

    /// Replace a comment's stored content.
    async fn update(&self, id: CommentId, content: &str) -> Result<(), StoreError>;

    async fn delete(&self, id: CommentId) -> Result<(), StoreError>;
}

#[async_trait(?Send)]
impl<S: CommentStore + ?Sized> CommentStore for Box<S> {
    async fn list(&self, entity: EntityRef) -> Result<Vec<CommentRecord>, StoreError> {
        (**self).list(entity).await
    }

    async fn create(&self, comment: &NewComment) -> Result<CommentId, StoreError> {
        (**self).create(comment).await
    }

    async fn update(&self, id: CommentId, content: &str) -> Result<(), StoreError> {
        (**self).update(id, content).await
    }

    async fn delete(&self, id: CommentId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}

#[async_trait(?Send)]
impl<S: CommentStore + ?Sized> CommentStore for Rc<S> {
    async fn list(&self, entity: EntityRef) -> Result<Vec<CommentRecord>, StoreError> {
        (**self).list(entity).await
    }

    async fn create(&self, comment: &NewComment) -> Result<CommentId, StoreError> {
        (**self).create(comment).await
    }

    async fn update(&self, id: CommentId, content: &str) -> Result<(), StoreError> {
        (**self).update(id, content).await
    }

    async fn delete(&self, id: CommentId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}
