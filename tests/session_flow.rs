//! End-to-end session behavior against a scripted store.

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use worktrack_ui::thread::encode_parent;
use worktrack_ui::{
    ActionError, CommentId, CommentRecord, CommentSession, CommentStore, EntityKind, EntityRef,
    LoadStatus, NewComment, ReloadOutcome, StoreError, ThreadPresenter, ThreadView,
};

// ── Helpers ─────────────────────────────────────────────────────────────

const ENTITY: EntityRef = EntityRef::new(EntityKind::WorkItem, 3);

fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(minute)
}

fn record(id: CommentId, content: &str, minute: i64) -> CommentRecord {
    CommentRecord {
        id,
        author_id: 1,
        author: None,
        content: content.to_string(),
        created_at: at(minute),
    }
}

/// Root 1 with `replies` direct replies, ids `2..`.
fn thread(replies: i64) -> Vec<CommentRecord> {
    let mut records = vec![record(1, "root", 0)];
    for n in 0..replies {
        let id = n + 2;
        records.push(record(id, &encode_parent(1, &format!("reply {id}")), id));
    }
    records
}

#[derive(Default)]
struct ScriptedStore {
    records: RefCell<Vec<CommentRecord>>,
    fail_list: Cell<bool>,
    fail_mutations: Cell<bool>,
    list_calls: Cell<usize>,
}

impl ScriptedStore {
    fn with(records: Vec<CommentRecord>) -> Self {
        Self {
            records: RefCell::new(records),
            ..Self::default()
        }
    }

    fn content_of(&self, id: CommentId) -> Option<String> {
        self.records
            .borrow()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.content.clone())
    }

    fn rejected(&self) -> Result<(), StoreError> {
        if self.fail_mutations.get() {
            return Err(StoreError::Mutation("400 Bad Request: rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl CommentStore for ScriptedStore {
    async fn list(&self, entity: EntityRef) -> Result<Vec<CommentRecord>, StoreError> {
        assert_eq!(entity, ENTITY);
        self.list_calls.set(self.list_calls.get() + 1);
        tokio::task::yield_now().await;
        if self.fail_list.get() {
            return Err(StoreError::Fetch("server unavailable".to_string()));
        }
        // Storage order is not creation order.
        let mut records = self.records.borrow().clone();
        records.reverse();
        Ok(records)
    }

    async fn create(&self, comment: &NewComment) -> Result<CommentId, StoreError> {
        self.rejected()?;
        let mut records = self.records.borrow_mut();
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        records.push(record(id, &comment.content, 1_000 + id));
        Ok(id)
    }

    async fn update(&self, id: CommentId, content: &str) -> Result<(), StoreError> {
        self.rejected()?;
        let mut records = self.records.borrow_mut();
        let target = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        target.content = content.to_string();
        Ok(())
    }

    async fn delete(&self, id: CommentId) -> Result<(), StoreError> {
        self.rejected()?;
        let mut records = self.records.borrow_mut();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    roots: Vec<CommentId>,
    highlight: Option<CommentId>,
}

#[derive(Default)]
struct RecordingPresenter {
    views: Vec<Snapshot>,
    failures: Vec<String>,
}

impl ThreadPresenter for RecordingPresenter {
    fn present(&mut self, view: &ThreadView<'_>) {
        self.views.push(Snapshot {
            roots: view.threads.iter().map(|t| t.root.id()).collect(),
            highlight: view.highlight,
        });
    }

    fn load_failed(&mut self, message: &str) {
        self.failures.push(message.to_string());
    }
}

fn session(records: Vec<CommentRecord>) -> CommentSession<ScriptedStore, RecordingPresenter> {
    CommentSession::new(
        ScriptedStore::with(records),
        RecordingPresenter::default(),
        ENTITY,
        10,
    )
}

// ── Tests ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn collapsed_thread_then_deep_link_expands_it() {
    let session = session(vec![
        record(1, "hello", 0),
        record(2, "[reply:1] world", 1),
        record(3, "[reply:1] third", 2),
    ]);
    session.load().await;

    assert_eq!(session.root_ids(), vec![1]);
    session.with_forest(|forest| {
        assert_eq!(forest.child_ids(1), &[2, 3]);
        assert_eq!(forest.get(2).unwrap().display_content, "world");
    });
    assert!(!session.is_expanded(1));
    assert_eq!(session.visible_replies(1), Some(vec![2]));

    let link = session.resolve_locator(3).await.unwrap();
    assert_eq!((link.root_id, link.page, link.size), (1, 1, 10));
    assert!(session.is_expanded(1));
    assert_eq!(session.visible_replies(1), Some(vec![2, 3]));
    assert_eq!(
        session.presenter().views.last().unwrap().highlight,
        Some(3)
    );
}

#[tokio::test]
async fn out_of_range_page_is_clamped_after_reload() {
    let session = session(thread(25));
    session.load().await;
    assert!(session.toggle(1).await.unwrap());

    session.change_page(1, 5).await.unwrap();

    assert_eq!(session.pager_entry(1).page, 3);
    assert_eq!(session.visible_replies(1), Some((22..=26).collect::<Vec<_>>()));
}

#[tokio::test]
async fn toggle_on_a_reply_toggles_its_root() {
    let mut records = thread(3);
    records.push(record(40, &encode_parent(2, "nested"), 50));
    let session = session(records);
    session.load().await;

    assert!(session.toggle(40).await.unwrap());
    assert!(session.is_expanded(1));
    assert!(!session.is_expanded(40));
    assert!(!session.toggle(3).await.unwrap());
    assert!(!session.is_expanded(1));
}

#[tokio::test]
async fn locator_given_before_first_load_is_applied_by_it() {
    let session = session(thread(25));

    assert_eq!(session.resolve_locator(14).await, None);

    assert_eq!(session.pending_locator(), None);
    assert!(session.is_expanded(1));
    assert_eq!(session.pager_entry(1).page, 2);
    assert!(session.visible_replies(1).unwrap().contains(&14));
    assert_eq!(session.presenter().views.len(), 1);
    assert_eq!(session.presenter().views[0].highlight, Some(14));
}

#[tokio::test]
async fn unresolved_locator_is_dropped_after_one_load() {
    let session = session(thread(3));
    session.load().await;

    assert_eq!(session.resolve_locator(77).await, None);
    assert_eq!(session.pending_locator(), None);
    assert!(!session.is_expanded(1));

    session
        .store()
        .records
        .borrow_mut()
        .push(record(77, &encode_parent(1, "late"), 90));
    session.load().await;
    assert!(!session.is_expanded(1));
    assert_eq!(session.presenter().views.last().unwrap().highlight, None);
}

#[tokio::test]
async fn fetch_failure_keeps_previous_forest_and_intent() {
    let session = session(thread(12));
    session.load().await;
    session.toggle(1).await.unwrap();
    session.change_page(1, 2).await.unwrap();

    session.store().fail_list.set(true);
    let outcome = session.load().await;

    assert_eq!(outcome, ReloadOutcome::Ran { runs: 1 });
    assert_eq!(
        session.status(),
        LoadStatus::Failed("failed to fetch comments: server unavailable".to_string())
    );
    assert_eq!(session.root_ids(), vec![1]);
    assert!(session.is_expanded(1));
    assert_eq!(session.pager_entry(1).page, 2);
    assert_eq!(session.presenter().failures.len(), 1);

    session.store().fail_list.set(false);
    session.load().await;
    assert_eq!(session.status(), LoadStatus::Loaded);
    assert_eq!(session.visible_replies(1), Some(vec![12, 13]));
}

#[tokio::test]
async fn reply_pages_to_the_new_comment() {
    let session = session(thread(10));
    session.load().await;

    let id = session.reply(1, "  late to the party  ").await.unwrap();

    assert_eq!(id, 12);
    assert_eq!(
        session.store().content_of(12).as_deref(),
        Some("[reply:1] late to the party")
    );
    assert!(session.is_expanded(1));
    assert_eq!(session.pager_entry(1).page, 2);
    assert_eq!(session.visible_replies(1), Some(vec![12]));
    assert_eq!(session.presenter().views.last().unwrap().highlight, Some(12));
}

#[tokio::test]
async fn nested_reply_expands_root_without_moving_pager() {
    let session = session(thread(12));
    session.load().await;

    let id = session.reply(3, "nested answer").await.unwrap();

    assert!(session.is_expanded(1));
    assert_eq!(session.pager_entry(1).page, 1);
    session.with_forest(|forest| {
        assert_eq!(forest.get(id).unwrap().reply_to, Some(3));
        assert_eq!(forest.depth_of(id), 2);
    });
}

#[tokio::test]
async fn edit_keeps_reply_marker_and_highlights() {
    let session = session(thread(2));
    session.load().await;

    session.edit(2, " reworded ").await.unwrap();
    assert_eq!(
        session.store().content_of(2).as_deref(),
        Some("[reply:1] reworded")
    );
    session.with_forest(|forest| {
        assert_eq!(forest.get(2).unwrap().display_content, "reworded");
        assert_eq!(forest.child_ids(1), &[2, 3]);
    });
    assert_eq!(session.presenter().views.last().unwrap().highlight, Some(2));

    session.edit(1, "root text").await.unwrap();
    assert_eq!(session.store().content_of(1).as_deref(), Some("root text"));

    session.load().await;
    assert_eq!(session.presenter().views.last().unwrap().highlight, None);
}

#[tokio::test]
async fn create_and_delete_reload() {
    let session = session(thread(1));
    session.load().await;

    let id = session.create("second topic").await.unwrap();
    assert_eq!(session.root_ids(), vec![1, id]);

    session.delete(1).await.unwrap();
    assert_eq!(session.root_ids(), vec![id]);
    assert_eq!(session.presenter().views.last().unwrap().roots, vec![id]);
    session.with_forest(|forest| assert!(!forest.is_visible(2)));
}

#[tokio::test]
async fn mutation_failure_does_not_reload() {
    let session = session(thread(2));
    session.load().await;
    let calls = session.store().list_calls.get();

    session.store().fail_mutations.set(true);
    let err = session.reply(1, "will fail").await.unwrap_err();
    assert!(matches!(err, ActionError::Store(StoreError::Mutation(_))));
    assert!(session.edit(2, "nope").await.is_err());
    assert!(session.delete(2).await.is_err());
    assert!(session.create("nope").await.is_err());

    assert_eq!(session.store().list_calls.get(), calls);
    assert!(!session.is_expanded(1));
}

#[tokio::test]
async fn invalid_actions_are_rejected_locally() {
    let session = session(thread(2));
    assert!(matches!(session.toggle(1).await, Err(ActionError::NotLoaded)));

    session.load().await;
    let calls = session.store().list_calls.get();

    assert!(matches!(session.create("   ").await, Err(ActionError::EmptyContent)));
    assert!(matches!(session.reply(1, "\n").await, Err(ActionError::EmptyContent)));
    assert!(matches!(
        session.toggle(999).await,
        Err(ActionError::UnknownComment(999))
    ));
    assert!(matches!(
        session.change_page(2, 1).await,
        Err(ActionError::UnknownComment(2))
    ));
    assert!(matches!(
        session.reply(999, "hi").await,
        Err(ActionError::UnknownComment(999))
    ));
    assert_eq!(session.store().list_calls.get(), calls);
}

#[tokio::test]
async fn orphans_stay_hidden_and_cannot_be_targeted() {
    let mut records = thread(2);
    records.push(record(50, &encode_parent(404, "stale"), 9));
    records.push(record(51, &encode_parent(50, "under stale"), 10));
    let session = session(records);
    session.load().await;

    assert_eq!(session.root_ids(), vec![1]);
    session.with_forest(|forest| {
        assert_eq!(forest.orphan_count(), 1);
        assert!(!forest.is_visible(51));
    });
    assert_eq!(session.resolve_locator(51).await, None);
    assert!(matches!(
        session.toggle(50).await,
        Err(ActionError::UnknownComment(50))
    ));
}

#[tokio::test]
async fn replies_past_the_depth_cap_stay_actionable() {
    // Root 1, then a chain 2..=41 where each replies to the one before.
    let mut records = vec![record(1, "root", 0)];
    for id in 2..=41 {
        records.push(record(id, &encode_parent(id - 1, &format!("level {id}")), id));
    }
    let session = session(records);
    session.load().await;
    session.with_forest(|forest| {
        assert!(forest.is_visible(41));
        assert_eq!(forest.root_of(41), Some(1));
    });

    let link = session.resolve_locator(41).await.unwrap();
    assert_eq!(link.root_id, 1);
    assert_eq!(link.page, 1);
    assert!(session.is_expanded(1));
    assert_eq!(session.presenter().views.last().unwrap().highlight, Some(41));

    let id = session.reply(41, "deeper still").await.unwrap();
    session.with_forest(|forest| {
        assert_eq!(forest.get(id).unwrap().reply_to, Some(41));
        assert_eq!(forest.root_of(id), Some(1));
    });

    session.edit(41, "level 41, edited").await.unwrap();
    assert_eq!(
        session.store().content_of(41).as_deref(),
        Some("[reply:40] level 41, edited")
    );
    assert!(session.toggle(id).await.is_ok());
    session.delete(id).await.unwrap();
    session.with_forest(|forest| assert!(forest.get(id).is_none()));
}

#[tokio::test]
async fn concurrent_requests_coalesce_into_one_follow_up() {
    let session = session(thread(3));

    let (a, b, c) = tokio::join!(session.load(), session.load(), session.load());
    let outcomes = [a, b, c];

    let ran: Vec<_> = outcomes
        .iter()
        .filter(|o| matches!(o, ReloadOutcome::Ran { .. }))
        .collect();
    assert_eq!(ran, vec![&ReloadOutcome::Ran { runs: 2 }]);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| **o == ReloadOutcome::Coalesced)
            .count(),
        2
    );
    assert_eq!(session.store().list_calls.get(), 2);
    assert_eq!(session.loader().total_runs(), 2);
    assert_eq!(session.presenter().views.len(), 2);
}
