//! Locator parsing: turn a page fragment or query value into a comment id.

use crate::model::CommentId;

const FRAGMENT_PREFIX: &str = "comment-";
const QUERY_KEY: &str = "commentId";

/// Parse a locator value.
///
/// Accepts `#comment-<id>`, `comment-<id>`, a query string containing
/// `commentId=<id>` (with or without a leading `?`, or a full URL), or a
/// bare positive integer.
#[must_use]
pub fn parse_locator(raw: &str) -> Option<CommentId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some((before, fragment)) = raw.split_once('#') {
        if let Some(id) = parse_fragment(fragment) {
            return Some(id);
        }
        return parse_query(before);
    }
    parse_fragment(raw)
        .or_else(|| parse_query(raw))
        .or_else(|| parse_id(raw))
}

fn parse_fragment(fragment: &str) -> Option<CommentId> {
    parse_id(fragment.strip_prefix(FRAGMENT_PREFIX)?)
}

fn parse_query(raw: &str) -> Option<CommentId> {
    let query = raw.split_once('?').map_or(raw, |(_, q)| q);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == QUERY_KEY)
        .and_then(|(_, value)| parse_id(value))
}

fn parse_id(raw: &str) -> Option<CommentId> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_forms() {
        assert_eq!(parse_locator("#comment-112"), Some(112));
        assert_eq!(parse_locator("comment-7"), Some(7));
        assert_eq!(parse_locator("https://tracker/p/3#comment-9"), Some(9));
    }

    #[test]
    fn query_forms() {
        assert_eq!(parse_locator("?commentId=42"), Some(42));
        assert_eq!(parse_locator("tab=comments&commentId=5"), Some(5));
        assert_eq!(
            parse_locator("https://tracker/work_item/3?tab=x&commentId=8#top"),
            Some(8)
        );
    }

    #[test]
    fn bare_integer() {
        assert_eq!(parse_locator(" 15 "), Some(15));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_locator(""), None);
        assert_eq!(parse_locator("#comment-"), None);
        assert_eq!(parse_locator("comment-12a"), None);
        assert_eq!(parse_locator("-3"), None);
        assert_eq!(parse_locator("0"), None);
        assert_eq!(parse_locator("commentId=x"), None);
        assert_eq!(parse_locator("99999999999999999999999"), None);
    }
}
