//! Reply references embedded in comment content.
//!
//! A reply is stored as `"[reply:<parent-id>] "` followed by the body. The
//! marker is only recognised at the very start of the content and is not
//! escaped anywhere else, so a body that literally begins with the marker
//! text is read as a reply.

use crate::model::CommentId;

const PREFIX_OPEN: &str = "[reply:";
const PREFIX_CLOSE: &str = "] ";

/// Result of splitting raw content into parent reference and display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedContent<'a> {
    pub parent_id: Option<CommentId>,
    pub display_content: &'a str,
}

/// Split a leading reply marker off `content`.
///
/// The marker is removed exactly once; anything after it (including a second
/// marker) is left in the display content.
#[must_use]
pub fn extract_parent(content: &str) -> ParsedContent<'_> {
    match split_prefix(content) {
        Some((parent_id, prefix_len)) => ParsedContent {
            parent_id: Some(parent_id),
            display_content: &content[prefix_len..],
        },
        None => ParsedContent {
            parent_id: None,
            display_content: content,
        },
    }
}

/// Build stored content for a reply to `parent_id`.
#[must_use]
pub fn encode_parent(parent_id: CommentId, body: &str) -> String {
    format!("{PREFIX_OPEN}{parent_id}{PREFIX_CLOSE}{body}")
}

/// The literal marker at the start of `content`, if any.
///
/// Used when editing a reply so the stored parent reference survives.
#[must_use]
pub fn reply_prefix(content: &str) -> Option<&str> {
    split_prefix(content).map(|(_, len)| &content[..len])
}

/// Returns the parsed parent id and the byte length of the whole marker.
fn split_prefix(content: &str) -> Option<(CommentId, usize)> {
    let rest = content.strip_prefix(PREFIX_OPEN)?;
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let (digits, tail) = rest.split_at(digits_len);
    if !tail.starts_with(PREFIX_CLOSE) {
        return None;
    }
    // Out-of-range ids cannot name a comment; treat as plain text.
    let parent_id = digits.parse::<CommentId>().ok()?;
    Some((parent_id, PREFIX_OPEN.len() + digits_len + PREFIX_CLOSE.len()))
}
