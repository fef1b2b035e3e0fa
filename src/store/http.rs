//! `CommentStore` over the work tracker's JSON API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CommentStore, NewComment};
use crate::error::StoreError;
use crate::model::{CommentId, CommentRecord, EntityRef};

/// Client for `{base}/comments/...`.
pub struct HttpStore {
    client: Client,
    base: String,
    token: Option<String>,
}

impl HttpStore {
    /// Build a store rooted at `base` (for example `http://host/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base: &str, token: Option<String>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("wt-comments/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn list_url(&self, entity: EntityRef) -> String {
        format!("{}/comments/{}/{}", self.base, entity.kind.as_str(), entity.id)
    }

    fn create_url(&self) -> String {
        format!("{}/comments/", self.base)
    }

    fn comment_url(&self, id: CommentId) -> String {
        format!("{}/comments/{id}", self.base)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

// -- Wire types --

#[derive(Serialize)]
struct CreateBody<'a> {
    entity_type: &'a str,
    entity_id: i64,
    content: &'a str,
}

#[derive(Serialize)]
struct EditBody<'a> {
    content: &'a str,
}

#[derive(Deserialize)]
struct IdResponse {
    id: CommentId,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Pull a readable message out of an error response body.
fn error_detail(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .map(|d| match d {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .filter(|d| !d.trim().is_empty());
    match detail {
        Some(detail) => format!("{status}: {detail}"),
        None if body.trim().is_empty() => status.to_string(),
        None => format!("{status}: {}", body.trim()),
    }
}

fn decode_records(body: &str) -> Result<Vec<CommentRecord>, StoreError> {
    Ok(serde_json::from_str(body)?)
}

async fn mutation_response(
    resp: Response,
    id: Option<CommentId>,
) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
        return Err(StoreError::NotFound(id));
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Mutation(error_detail(status, &body)))
}

#[async_trait(?Send)]
impl CommentStore for HttpStore {
    async fn list(&self, entity: EntityRef) -> Result<Vec<CommentRecord>, StoreError> {
        let url = self.list_url(entity);
        debug!(%url, "listing comments");
        let resp = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))?;
        if !status.is_success() {
            return Err(StoreError::Fetch(error_detail(status, &body)));
        }
        decode_records(&body)
    }

    async fn create(&self, comment: &NewComment) -> Result<CommentId, StoreError> {
        let body = CreateBody {
            entity_type: comment.entity.kind.as_str(),
            entity_id: comment.entity.id,
            content: &comment.content,
        };
        let resp = self
            .authorized(self.client.post(self.create_url()).json(&body))
            .send()
            .await?;
        let created: IdResponse = mutation_response(resp, None).await?.json().await?;
        debug!(id = created.id, "comment created");
        Ok(created.id)
    }

    async fn update(&self, id: CommentId, content: &str) -> Result<(), StoreError> {
        let resp = self
            .authorized(
                self.client
                    .patch(self.comment_url(id))
                    .json(&EditBody { content }),
            )
            .send()
            .await?;
        mutation_response(resp, Some(id)).await?;
        Ok(())
    }

    async fn delete(&self, id: CommentId) -> Result<(), StoreError> {
        let resp = self
            .authorized(self.client.delete(self.comment_url(id)))
            .send()
            .await?;
        mutation_response(resp, Some(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;

    #[test]
    fn urls_follow_api_layout() {
        let store = HttpStore::new("http://tracker.local/api/", None).unwrap();
        let entity = EntityRef::new(EntityKind::WorkItem, 42);
        assert_eq!(
            store.list_url(entity),
            "http://tracker.local/api/comments/work_item/42"
        );
        assert_eq!(store.create_url(), "http://tracker.local/api/comments/");
        assert_eq!(store.comment_url(9), "http://tracker.local/api/comments/9");
    }

    #[test]
    fn error_detail_prefers_detail_field() {
        let msg = error_detail(StatusCode::BAD_REQUEST, r#"{"detail":"comment not found"}"#);
        assert_eq!(msg, "400 Bad Request: comment not found");
    }

    #[test]
    fn error_detail_falls_back_to_body_or_status() {
        assert_eq!(
            error_detail(StatusCode::BAD_GATEWAY, "upstream down"),
            "502 Bad Gateway: upstream down"
        );
        assert_eq!(
            error_detail(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "500 Internal Server Error"
        );
        let structured = error_detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["body","content"]}]}"#,
        );
        assert!(structured.starts_with("422 Unprocessable Entity: ["));
    }

    #[test]
    fn list_payload_decodes() {
        let body = r#"[
            {"id": 1, "author_id": 3,
             "author": {"id": 3, "username": "carol", "email_prefix": "carol", "full_name": null},
             "content": "<p>hi</p>", "created_at": "2025-01-27T09:00:00"},
            {"id": 2, "author_id": 4, "author": null,
             "content": "[reply:1] ok", "created_at": "2025-01-27T09:05:00.123456+00:00"}
        ]"#;
        let records = decode_records(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].author_label(), "carol");
        assert_eq!(records[1].author_label(), "User #4");
    }

    #[test]
    fn malformed_list_payload_is_a_json_error() {
        let err = decode_records(r#"{"comments": []}"#).unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
        assert!(err.to_string().starts_with("invalid comment payload: "));
    }
}
