//! Comment records as the storage collaborator returns them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned comment identifier.
pub type CommentId = i64;

/// Kind of entity a comment list hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    WorkItem,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::WorkItem => "work_item",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(Self::Project),
            "work_item" | "work-item" => Ok(Self::WorkItem),
            other => Err(format!("unknown entity type: {other}")),
        }
    }
}

/// The (entity-type, entity-id) pair a comment list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: i64,
}

impl EntityRef {
    #[must_use]
    pub const fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Denormalized author display info attached to each record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub email_prefix: Option<String>,
    pub full_name: Option<String>,
}

/// A single comment, immutable for the lifetime of one fetch.
///
/// `content` is the raw stored text and may start with a reply prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: CommentId,
    pub author_id: i64,
    #[serde(default)]
    pub author: Option<AuthorInfo>,
    pub content: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl CommentRecord {
    /// Display label for the author.
    ///
    /// Falls back through full name, username and email prefix before
    /// using the numeric author id.
    #[must_use]
    pub fn author_label(&self) -> String {
        self.author
            .as_ref()
            .and_then(|a| {
                [&a.full_name, &a.username, &a.email_prefix]
                    .into_iter()
                    .flatten()
                    .find(|s| !s.trim().is_empty())
                    .cloned()
            })
            .unwrap_or_else(|| format!("User #{}", self.author_id))
    }
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339 and naive ISO 8601; naive values are taken as UTC.
///
/// # Errors
///
/// Returns an error message if the value matches neither form.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("invalid timestamp: {raw}"))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}
