//! Local SQLite comment store.
//!
//! Mirrors the server's comment table closely enough to run the client
//! offline and in demo mode. Deletes are soft: the row keeps its content and
//! gets a `deleted_at` stamp.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use rusqlite::{Connection, Params, params};

use super::{CommentStore, NewComment};
use crate::error::StoreError;
use crate::model::{AuthorInfo, CommentId, CommentRecord, EntityRef, parse_timestamp};
use crate::thread::reply::encode_parent;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT,
    email_prefix TEXT,
    full_name TEXT
);
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL CHECK (entity_type IN ('project', 'work_item')),
    entity_id INTEGER NOT NULL,
    author_id INTEGER NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT,
    deleted_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_comment_entity ON comments (entity_type, entity_id);
";

/// Author used for demo data and for comments created without a session user.
pub const DEMO_AUTHOR_ID: i64 = 1;

/// Raw row before timestamp parsing.
struct CommentRow {
    id: CommentId,
    author_id: i64,
    user_id: Option<i64>,
    username: Option<String>,
    email_prefix: Option<String>,
    full_name: Option<String>,
    content: String,
    created_at: String,
}

impl CommentRow {
    fn into_record(self) -> Result<CommentRecord, StoreError> {
        let created_at = parse_timestamp(&self.created_at).map_err(StoreError::Decode)?;
        let author = self.user_id.map(|id| AuthorInfo {
            id: Some(id),
            username: self.username,
            email_prefix: self.email_prefix,
            full_name: self.full_name,
        });
        Ok(CommentRecord {
            id: self.id,
            author_id: self.author_id,
            author,
            content: self.content,
            created_at,
        })
    }
}

/// Comment store backed by a local SQLite file (or memory).
pub struct SqliteStore {
    conn: Connection,
    author_id: i64,
}

impl SqliteStore {
    /// Open (creating if needed) a store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot be
    /// created.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open an empty in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            author_id: DEMO_AUTHOR_ID,
        })
    }

    /// Attribute comments created through this store to `author_id`.
    #[must_use]
    pub const fn with_author(mut self, author_id: i64) -> Self {
        self.author_id = author_id;
        self
    }

    /// Insert or replace a user row.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn add_user(
        &self,
        id: i64,
        username: &str,
        full_name: Option<&str>,
    ) -> Result<(), StoreError> {
        let email_prefix = username.to_lowercase();
        self.conn.execute(
            "INSERT OR REPLACE INTO users (id, username, email_prefix, full_name)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, username, email_prefix, full_name],
        )?;
        Ok(())
    }

    /// Insert a comment with an explicit author and timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_at(
        &self,
        entity: EntityRef,
        author_id: i64,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<CommentId, StoreError> {
        self.conn.execute(
            "INSERT INTO comments (entity_type, entity_id, author_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entity.kind.as_str(),
                entity.id,
                author_id,
                content,
                format_timestamp(created_at)
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Fill `entity` with a small conversation for demo mode.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails.
    pub fn seed_demo(&self, entity: EntityRef) -> Result<(), StoreError> {
        self.add_user(1, "alice", Some("Alice Chen"))?;
        self.add_user(2, "bob", None)?;
        self.add_user(3, "carol", Some("Carol Diaz"))?;

        let base = Utc
            .with_ymd_and_hms(2025, 1, 27, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let at = |minutes: i64| base + Duration::minutes(minutes);

        let kickoff = self.insert_at(
            entity,
            1,
            "<p>Kickoff notes are in the wiki. Please review before Friday.</p>",
            at(0),
        )?;
        let question = self.insert_at(
            entity,
            2,
            &encode_parent(kickoff, "Do we still target the March milestone?"),
            at(5),
        )?;
        self.insert_at(
            entity,
            1,
            &encode_parent(question, "Yes, scope is frozen."),
            at(9),
        )?;
        for n in 1..=11 {
            let author = if n % 2 == 0 { 2 } else { 3 };
            self.insert_at(
                entity,
                author,
                &encode_parent(kickoff, &format!("Reviewed section {n}.")),
                at(10 + n),
            )?;
        }

        let design = self.insert_at(
            entity,
            3,
            "<p>Design review moved to <b>Thursday</b>.</p>",
            at(60),
        )?;
        self.insert_at(
            entity,
            2,
            &encode_parent(design, "Thursday works for me."),
            at(64),
        )?;
        Ok(())
    }

    fn list_rows(&self, entity: EntityRef) -> Result<Vec<CommentRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.author_id, u.id, u.username, u.email_prefix, u.full_name,
                    c.content, c.created_at
             FROM comments c
             LEFT JOIN users u ON u.id = c.author_id
             WHERE c.entity_type = ?1 AND c.entity_id = ?2 AND c.deleted_at IS NULL
             ORDER BY c.created_at, c.id",
        )?;
        let rows = stmt
            .query_map(params![entity.kind.as_str(), entity.id], |row| {
                Ok(CommentRow {
                    id: row.get(0)?,
                    author_id: row.get(1)?,
                    user_id: row.get(2)?,
                    username: row.get(3)?,
                    email_prefix: row.get(4)?,
                    full_name: row.get(5)?,
                    content: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Run a write against one live comment; zero rows touched is `NotFound`.
    fn touch_live(&self, sql: &str, params: impl Params, id: CommentId) -> Result<(), StoreError> {
        let changed = self.conn.execute(sql, params)?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl CommentStore for SqliteStore {
    async fn list(&self, entity: EntityRef) -> Result<Vec<CommentRecord>, StoreError> {
        self.list_rows(entity)?
            .into_iter()
            .map(CommentRow::into_record)
            .collect()
    }

    async fn create(&self, comment: &NewComment) -> Result<CommentId, StoreError> {
        self.insert_at(comment.entity, self.author_id, &comment.content, Utc::now())
    }

    async fn update(&self, id: CommentId, content: &str) -> Result<(), StoreError> {
        let now = format_timestamp(Utc::now());
        self.touch_live(
            "UPDATE comments SET content = ?1, updated_at = ?2
             WHERE id = ?3 AND deleted_at IS NULL",
            params![content, now, id],
            id,
        )
    }

    async fn delete(&self, id: CommentId) -> Result<(), StoreError> {
        self.touch_live(
            "UPDATE comments SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![format_timestamp(Utc::now()), id],
            id,
        )
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
