//! One entity's comment session.
//!
//! Owns the cross-reload state (expansion, pager, pending deep link) and the
//! latest forest. Every user action updates that state synchronously and
//! then requests a reload through the single-flight loader; the reload
//! refetches, rebuilds the forest and hands a fresh view to the presenter.

use std::cell::{Ref, RefCell};

use tracing::{debug, info, warn};

use crate::error::{ActionError, StoreError};
use crate::loader::{ReloadOutcome, SingleFlightLoader};
use crate::model::{CommentId, EntityRef};
use crate::store::{CommentStore, NewComment};
use crate::thread::reply::reply_prefix;
use crate::thread::{
    DeepLink, ExpansionState, Forest, PagerEntry, PagerState, encode_parent, forest_slices,
    normalize_to_root, resolve, thread_slice,
};
use crate::view::{ThreadPresenter, ThreadView};

/// Outcome of the most recent list fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    NotLoaded,
    Loaded,
    /// The last fetch failed; the previous forest is still shown.
    Failed(String),
}

#[derive(Debug, Default)]
struct SessionState {
    forest: Forest,
    expansion: ExpansionState,
    pager: PagerState,
    status: LoadStatus,
    /// Target retried against the next successfully fetched forest.
    pending_locator: Option<CommentId>,
    /// Marked in the next render only.
    highlight: Option<CommentId>,
}

impl SessionState {
    fn visible_root(&self, id: CommentId) -> Result<CommentId, ActionError> {
        if self.status == LoadStatus::NotLoaded {
            return Err(ActionError::NotLoaded);
        }
        if !self.forest.is_visible(id) {
            return Err(ActionError::UnknownComment(id));
        }
        normalize_to_root(&self.forest, id).ok_or(ActionError::UnknownComment(id))
    }
}

pub struct CommentSession<S, P> {
    store: S,
    entity: EntityRef,
    presenter: RefCell<P>,
    state: RefCell<SessionState>,
    loader: SingleFlightLoader,
}

impl<S: CommentStore, P: ThreadPresenter> CommentSession<S, P> {
    pub fn new(store: S, presenter: P, entity: EntityRef, page_size: usize) -> Self {
        let state = SessionState {
            pager: PagerState::with_default_size(page_size),
            ..SessionState::default()
        };
        Self {
            store,
            entity,
            presenter: RefCell::new(presenter),
            state: RefCell::new(state),
            loader: SingleFlightLoader::new(),
        }
    }

    /// Refetch and re-render, coalescing with any reload in flight.
    pub async fn load(&self) -> ReloadOutcome {
        self.loader.request_reload(|| self.reload_once()).await
    }

    /// Flip the expansion of the thread containing `id`.
    ///
    /// Any id in a thread toggles that thread's root. Returns the new state.
    ///
    /// # Errors
    ///
    /// Fails without reloading if `id` is not a visible comment.
    pub async fn toggle(&self, id: CommentId) -> Result<bool, ActionError> {
        let expanded = {
            let mut state = self.state.borrow_mut();
            let root = state.visible_root(id)?;
            let expanded = state.expansion.toggle(root);
            debug!(root_id = root, expanded, "toggled thread");
            expanded
        };
        self.load().await;
        Ok(expanded)
    }

    /// Request page `page` of `root`'s replies. Out-of-range pages are
    /// clamped when the thread is next drawn.
    ///
    /// # Errors
    ///
    /// Fails without reloading if `root` is not a visible root.
    pub async fn change_page(&self, root: CommentId, page: usize) -> Result<(), ActionError> {
        {
            let mut state = self.state.borrow_mut();
            if state.visible_root(root)? != root {
                return Err(ActionError::UnknownComment(root));
            }
            state.pager.set_page(root, page);
        }
        self.load().await;
        Ok(())
    }

    /// Deep-link to `target`.
    ///
    /// Resolves against the current forest when possible; otherwise the
    /// target is retried once against the next fetched forest. Always
    /// reloads. Returns the resolution if it happened immediately.
    pub async fn resolve_locator(&self, target: CommentId) -> Option<DeepLink> {
        let link = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let link = resolve(&state.forest, &mut state.expansion, &mut state.pager, target);
            if link.is_some() {
                state.pending_locator = None;
                state.highlight = Some(target);
            } else {
                debug!(comment_id = target, "deep link deferred to next load");
                state.pending_locator = Some(target);
            }
            link
        };
        self.load().await;
        link
    }

    /// Post a top-level comment.
    ///
    /// # Errors
    ///
    /// Rejects blank bodies; store failures are returned without a reload.
    pub async fn create(&self, body: &str) -> Result<CommentId, ActionError> {
        let body = non_empty(body)?;
        let id = self
            .store
            .create(&NewComment {
                entity: self.entity,
                content: body.to_string(),
            })
            .await
            .map_err(|err| mutation_failed("create", err))?;
        info!(comment_id = id, entity = %self.entity, "comment created");
        self.state.borrow_mut().pending_locator = None;
        self.load().await;
        Ok(id)
    }

    /// Reply to `parent_id`, then page to the new reply.
    ///
    /// # Errors
    ///
    /// Fails if the body is blank, the parent is not visible, or the store
    /// rejects the reply. None of these reload.
    pub async fn reply(&self, parent_id: CommentId, body: &str) -> Result<CommentId, ActionError> {
        let body = non_empty(body)?;
        let root = self.state.borrow().visible_root(parent_id)?;
        let id = self
            .store
            .create(&NewComment {
                entity: self.entity,
                content: encode_parent(parent_id, body),
            })
            .await
            .map_err(|err| mutation_failed("reply", err))?;
        info!(comment_id = id, parent_id, "reply created");
        {
            let mut state = self.state.borrow_mut();
            state.expansion.set_expanded(root, true);
            state.pending_locator = Some(id);
        }
        self.load().await;
        Ok(id)
    }

    /// Replace the body of `id`, keeping its reply marker.
    ///
    /// # Errors
    ///
    /// Fails if the body is blank, `id` is not visible, or the store rejects
    /// the edit. None of these reload.
    pub async fn edit(&self, id: CommentId, body: &str) -> Result<(), ActionError> {
        let body = non_empty(body)?;
        let content = {
            let state = self.state.borrow();
            state.visible_root(id)?;
            let node = state.forest.get(id).ok_or(ActionError::UnknownComment(id))?;
            match reply_prefix(&node.record.content) {
                Some(prefix) => format!("{prefix}{body}"),
                None => body.to_string(),
            }
        };
        self.store
            .update(id, &content)
            .await
            .map_err(|err| mutation_failed("edit", err))?;
        info!(comment_id = id, "comment edited");
        self.state.borrow_mut().highlight = Some(id);
        self.load().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if `id` is not visible or the store rejects the delete.
    pub async fn delete(&self, id: CommentId) -> Result<(), ActionError> {
        self.state.borrow().visible_root(id)?;
        self.store
            .delete(id)
            .await
            .map_err(|err| mutation_failed("delete", err))?;
        info!(comment_id = id, "comment deleted");
        self.load().await;
        Ok(())
    }

    async fn reload_once(&self) -> Result<(), StoreError> {
        match self.store.list(self.entity).await {
            Ok(records) => {
                self.apply(Forest::build(records));
                self.render();
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                self.state.borrow_mut().status = LoadStatus::Failed(message.clone());
                self.presenter.borrow_mut().load_failed(&message);
                Err(err)
            }
        }
    }

    fn apply(&self, forest: Forest) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.forest = forest;
        state.status = LoadStatus::Loaded;

        let forest = &state.forest;
        state.pager.clamp_all(|root| {
            forest
                .get(root)
                .filter(|node| node.is_root() && forest.is_visible(root))
                .map(|_| forest.child_ids(root).len())
        });

        if let Some(target) = state.pending_locator.take() {
            match resolve(&state.forest, &mut state.expansion, &mut state.pager, target) {
                Some(link) => {
                    debug!(comment_id = target, root_id = link.root_id, page = link.page, "deep link resolved");
                    state.highlight = Some(target);
                }
                None => debug!(comment_id = target, "deep link target not found; dropped"),
            }
        }

        info!(
            entity = %self.entity,
            comments = state.forest.len(),
            threads = state.forest.root_ids().len(),
            orphans = state.forest.orphan_count(),
            "comments loaded"
        );
    }

    fn render(&self) {
        let mut guard = self.state.borrow_mut();
        let highlight = guard.highlight.take();
        let state = &*guard;
        let view = ThreadView {
            entity: self.entity,
            forest: &state.forest,
            threads: forest_slices(&state.forest, &state.expansion, &state.pager),
            highlight,
        };
        self.presenter.borrow_mut().present(&view);
    }

    #[must_use]
    pub const fn entity(&self) -> EntityRef {
        self.entity
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn presenter(&self) -> Ref<'_, P> {
        self.presenter.borrow()
    }

    pub const fn loader(&self) -> &SingleFlightLoader {
        &self.loader
    }

    #[must_use]
    pub fn status(&self) -> LoadStatus {
        self.state.borrow().status.clone()
    }

    #[must_use]
    pub fn is_expanded(&self, root: CommentId) -> bool {
        self.state.borrow().expansion.is_expanded(root)
    }

    #[must_use]
    pub fn pager_entry(&self, root: CommentId) -> PagerEntry {
        self.state.borrow().pager.entry(root)
    }

    #[must_use]
    pub fn pending_locator(&self) -> Option<CommentId> {
        self.state.borrow().pending_locator
    }

    #[must_use]
    pub fn root_ids(&self) -> Vec<CommentId> {
        self.state.borrow().forest.root_ids().to_vec()
    }

    /// Ids of the direct replies of `root` currently drawn.
    #[must_use]
    pub fn visible_replies(&self, root: CommentId) -> Option<Vec<CommentId>> {
        let state = self.state.borrow();
        thread_slice(&state.forest, &state.expansion, &state.pager, root).map(|s| s.reply_ids())
    }

    /// Run `f` against the latest forest.
    pub fn with_forest<R>(&self, f: impl FnOnce(&Forest) -> R) -> R {
        f(&self.state.borrow().forest)
    }
}

fn non_empty(body: &str) -> Result<&str, ActionError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ActionError::EmptyContent);
    }
    Ok(body)
}

fn mutation_failed(action: &str, err: StoreError) -> ActionError {
    warn!(action, error = %err, "comment mutation failed");
    ActionError::Store(err)
}
