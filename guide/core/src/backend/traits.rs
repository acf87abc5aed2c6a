//! Journal Backend Traits
//!
//! Trait definition for the REMinder journal backend. The Flask service that
//! performs dream analysis, chat replies, and image generation lives behind
//! this abstraction, so the Guide core works identically against the real
//! HTTP service and against in-memory mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dream::DreamRecord;

/// Errors from journal backend calls
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network-level failure (connection refused, timeout, bad TLS)
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status; carries the backend-provided error message
    /// or a generic fallback
    #[error("{0}")]
    Rejected(String),

    /// The response body did not have the expected shape
    #[error("invalid response shape: {0}")]
    Shape(String),

    /// No stored auth token for an authenticated call
    #[error("You are not logged in.")]
    MissingAuth,
}

/// Dream context attached to chat turns
///
/// A trimmed view of the dream the conversation is about; sent verbatim to
/// the chatbot endpoints as `dream_context`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DreamContext {
    /// Backend record id
    pub id: Option<i64>,
    /// Dream title
    pub title: Option<String>,
    /// Dream narrative text
    pub content: Option<String>,
    /// Dominant mood label
    pub mood: Option<String>,
}

impl DreamContext {
    /// The dream id for follow-up payloads
    ///
    /// Falls back to 1 when the context has no id, matching the wire
    /// behavior the backend expects.
    pub fn dream_id(&self) -> i64 {
        self.id.unwrap_or(1)
    }
}

impl From<&DreamRecord> for DreamContext {
    fn from(record: &DreamRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            content: record.content.clone(),
            mood: record.mood.clone(),
        }
    }
}

/// How a guide reply should be treated by the turn controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    /// A plain answer; the next user message starts a fresh turn
    #[default]
    Answer,
    /// A question; the next user message is routed as its answer
    Question,
}

/// A reply from the chatbot endpoints
#[derive(Clone, Debug)]
pub struct TurnReply {
    /// The reply text
    pub response: String,
    /// Whether the reply is a follow-up question
    pub kind: ReplyKind,
}

impl TurnReply {
    /// Whether this reply should become the pending question
    pub fn is_question(&self) -> bool {
        self.kind == ReplyKind::Question
    }
}

/// Journal backend trait
///
/// Implement this to point the Guide at a different journal service, or at
/// a mock in tests.
#[async_trait]
pub trait JournalBackend: Send + Sync {
    /// Backend name for logging (e.g. "Flask")
    fn name(&self) -> &str;

    /// Check whether the backend is reachable
    async fn health_check(&self) -> bool;

    /// Fresh chat turn (`/chatbot/respond`)
    async fn respond(
        &self,
        page: &str,
        message: &str,
        context: Option<&DreamContext>,
    ) -> Result<TurnReply, BackendError>;

    /// Answer to an outstanding follow-up question (`/chatbot/followup`)
    async fn followup(
        &self,
        dream_id: i64,
        question: &str,
        answer: &str,
        context: Option<&DreamContext>,
    ) -> Result<TurnReply, BackendError>;

    /// Generate illustrative images from dream text (`/visualize_dream`)
    ///
    /// Requires a bearer token. Returns the generated image URLs in order.
    async fn visualize_dream(&self, dream: &str, token: &str)
        -> Result<Vec<String>, BackendError>;

    /// Submit a new dream for analysis (`/add_dream`)
    async fn add_dream(&self, title: &str, content: &str, token: &str)
        -> Result<(), BackendError>;

    /// Fetch the user's analyzed dreams, newest first (`/get_dreams`)
    async fn list_dreams(&self, token: &str) -> Result<Vec<DreamRecord>, BackendError>;

    /// Delete a dream record (`/delete_dream/<id>`)
    async fn delete_dream(&self, dream_id: i64, token: &str) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_kind_parses_question_tag() {
        let kind: ReplyKind = serde_json::from_str("\"question\"").unwrap();
        assert_eq!(kind, ReplyKind::Question);
    }

    #[test]
    fn test_dream_id_fallback() {
        let ctx = DreamContext::default();
        assert_eq!(ctx.dream_id(), 1);

        let ctx = DreamContext {
            id: Some(42),
            ..Default::default()
        };
        assert_eq!(ctx.dream_id(), 42);
    }

    #[test]
    fn test_context_from_record() {
        let record = DreamRecord {
            id: Some(7),
            title: Some("Falling".to_string()),
            mood: Some("fear".to_string()),
            ..Default::default()
        };
        let ctx = DreamContext::from(&record);
        assert_eq!(ctx.id, Some(7));
        assert_eq!(ctx.title.as_deref(), Some("Falling"));
        assert_eq!(ctx.mood.as_deref(), Some("fear"));
    }
}
