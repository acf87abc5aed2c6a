//! HTTP Journal Backend
//!
//! [`JournalBackend`] implementation against the REMinder Flask service.
//!
//! # Endpoints
//!
//! - `POST /chatbot/respond` - fresh chat turn
//! - `POST /chatbot/followup` - answer to an outstanding question
//! - `POST /visualize_dream` - dream-to-image generation (bearer auth)
//! - `POST /add_dream` - submit a dream for analysis (bearer auth)
//! - `GET /get_dreams` - analyzed dreams, newest first (bearer auth)
//! - `DELETE /delete_dream/<id>` - remove a dream (bearer auth)
//!
//! Non-success responses carry `{"error": "..."}`; that message is surfaced
//! to the user, with a generic fallback when the body is unusable. There are
//! no retries - every failure is terminal for that single user action.

use std::time::Duration;

use async_trait::async_trait;

use super::traits::{BackendError, DreamContext, JournalBackend, ReplyKind, TurnReply};
use crate::config::GuideConfig;
use crate::dream::DreamRecord;

/// Fallback message when an error body has no usable `error` field
const GENERIC_ERROR: &str = "Request failed";

/// HTTP client for the REMinder journal backend
#[derive(Clone)]
pub struct HttpJournalBackend {
    /// Service base URL, e.g. `http://127.0.0.1:5000`
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpJournalBackend {
    /// Create a backend for the given base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create a backend from configuration
    #[must_use]
    pub fn from_config(config: &GuideConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Full URL for a path
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into a [`BackendError::Rejected`]
    ///
    /// Prefers the backend's `error` field, falls back to the given message.
    async fn rejection(response: reqwest::Response, fallback: &str) -> BackendError {
        let status = response.status();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("error")
                    .and_then(|e| e.as_str())
                    .map(String::from)
            })
            .unwrap_or_else(|| fallback.to_string());
        tracing::warn!(%status, %message, "backend rejected request");
        BackendError::Rejected(message)
    }

    /// Parse a `{response, type?}` chatbot reply
    fn parse_turn_reply(body: serde_json::Value) -> Result<TurnReply, BackendError> {
        let response = body
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or_else(|| BackendError::Shape("missing response field".to_string()))?
            .to_string();

        let kind = match body.get("type").and_then(|t| t.as_str()) {
            Some("question") => ReplyKind::Question,
            _ => ReplyKind::Answer,
        };

        Ok(TurnReply { response, kind })
    }
}

#[async_trait]
impl JournalBackend for HttpJournalBackend {
    fn name(&self) -> &str {
        "Flask"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.url("/"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn respond(
        &self,
        page: &str,
        message: &str,
        context: Option<&DreamContext>,
    ) -> Result<TurnReply, BackendError> {
        let payload = serde_json::json!({
            "page": page,
            "message": message,
            "dream_context": context,
        });

        let response = self
            .http_client
            .post(self.url("/chatbot/respond"))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, GENERIC_ERROR).await);
        }

        Self::parse_turn_reply(response.json().await?)
    }

    async fn followup(
        &self,
        dream_id: i64,
        question: &str,
        answer: &str,
        context: Option<&DreamContext>,
    ) -> Result<TurnReply, BackendError> {
        let payload = serde_json::json!({
            "dream_id": dream_id,
            "question": question,
            "answer": answer,
            "dream_context": context,
        });

        let response = self
            .http_client
            .post(self.url("/chatbot/followup"))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, GENERIC_ERROR).await);
        }

        Self::parse_turn_reply(response.json().await?)
    }

    async fn visualize_dream(
        &self,
        dream: &str,
        token: &str,
    ) -> Result<Vec<String>, BackendError> {
        let payload = serde_json::json!({ "dream": dream });

        let response = self
            .http_client
            .post(self.url("/visualize_dream"))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, "Image generation failed").await);
        }

        let body: serde_json::Value = response.json().await?;
        let images = body
            .get("images")
            .and_then(|i| i.as_array())
            .ok_or_else(|| BackendError::Shape("Invalid image response".to_string()))?;

        images
            .iter()
            .map(|url| {
                url.as_str()
                    .map(String::from)
                    .ok_or_else(|| BackendError::Shape("Invalid image response".to_string()))
            })
            .collect()
    }

    async fn add_dream(
        &self,
        title: &str,
        content: &str,
        token: &str,
    ) -> Result<(), BackendError> {
        let payload = serde_json::json!({
            "title": title,
            "content": content,
        });

        let response = self
            .http_client
            .post(self.url("/add_dream"))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, "Error saving dream.").await);
        }

        Ok(())
    }

    async fn list_dreams(&self, token: &str) -> Result<Vec<DreamRecord>, BackendError> {
        let response = self
            .http_client
            .get(self.url("/get_dreams"))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, "Failed to load dreams").await);
        }

        response
            .json::<Vec<DreamRecord>>()
            .await
            .map_err(|e| BackendError::Shape(e.to_string()))
    }

    async fn delete_dream(&self, dream_id: i64, token: &str) -> Result<(), BackendError> {
        let response = self
            .http_client
            .delete(self.url(&format!("/delete_dream/{dream_id}")))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, "Failed to delete dream").await);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let backend = HttpJournalBackend::new("http://127.0.0.1:5000/", Duration::from_secs(5));
        assert_eq!(
            backend.url("/chatbot/respond"),
            "http://127.0.0.1:5000/chatbot/respond"
        );
    }

    #[test]
    fn test_parse_turn_reply_answer() {
        let body = serde_json::json!({ "response": "Sleep well." });
        let reply = HttpJournalBackend::parse_turn_reply(body).unwrap();
        assert_eq!(reply.response, "Sleep well.");
        assert_eq!(reply.kind, ReplyKind::Answer);
    }

    #[test]
    fn test_parse_turn_reply_question() {
        let body = serde_json::json!({
            "response": "How did the fall end?",
            "type": "question",
        });
        let reply = HttpJournalBackend::parse_turn_reply(body).unwrap();
        assert!(reply.is_question());
    }

    #[test]
    fn test_parse_turn_reply_missing_response_is_shape_error() {
        let body = serde_json::json!({ "type": "question" });
        let err = HttpJournalBackend::parse_turn_reply(body).unwrap_err();
        assert!(matches!(err, BackendError::Shape(_)));
    }
}
