//! The Guide - Chat Turn Controller
//!
//! Orchestrates conversation turns with the journal backend. The Guide
//! decides, per user input, whether to call the fresh-turn endpoint or the
//! follow-up endpoint, and drives the typing/pending state through the
//! shared [`ChatSession`].
//!
//! # Design Philosophy
//!
//! The Guide is UI-agnostic. Surfaces send it user input and receive
//! [`GuideMessage`] values on a channel; they never mutate turn state
//! directly. Exactly one turn is in flight at a time, enforced by the
//! session's turn gate - a second send while a turn is pending is dropped,
//! not queued, so messages always append in issuance order.
//!
//! A reply is surfaced only after the configured "thinking" delay, and a
//! failed turn produces a visible error bubble rather than an empty reply.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::backend::{DreamContext, JournalBackend, TurnReply};
use crate::config::GuideConfig;
use crate::dream::DreamRecord;
use crate::messages::{GuideMessage, MessageRole, NotifyLevel};
use crate::session::{ChatSession, SharedSession};

/// Invitation shown when the chat is primed with a fresh dream context
pub const CONTEXT_INVITATION: &str = "I can help you explore this dream further \
\u{2014} ask about symbols, emotions, or patterns you notice.";

/// The Guide - headless chat turn controller
pub struct Guide<B: JournalBackend> {
    /// Configuration
    config: GuideConfig,
    /// Journal backend
    backend: Arc<B>,
    /// Shared chat session
    session: SharedSession,
    /// Dream the conversation is currently about
    context: Mutex<Option<DreamContext>>,
    /// Channel to the UI surface
    tx: mpsc::Sender<GuideMessage>,
}

impl<B: JournalBackend + 'static> Guide<B> {
    /// Create a new Guide with the given backend
    pub fn new(backend: B, config: GuideConfig, tx: mpsc::Sender<GuideMessage>) -> Self {
        Self {
            config,
            backend: Arc::new(backend),
            session: ChatSession::shared(),
            context: Mutex::new(None),
            tx,
        }
    }

    /// Shared handle to the chat session
    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    /// Shared handle to the backend
    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    /// The configuration in use
    pub fn config(&self) -> &GuideConfig {
        &self.config
    }

    /// Set or clear the dream context attached to chat turns
    pub fn set_dream_context(&self, context: Option<DreamContext>) {
        *self.context.lock() = context;
    }

    /// Check backend reachability and warn the surface when it is down
    pub async fn start(&self) {
        if !self.backend.health_check().await {
            tracing::warn!(backend = self.backend.name(), "journal backend unreachable");
            self.notify(
                NotifyLevel::Warning,
                "Journal backend not available - chat and analysis will fail until it is up",
            )
            .await;
        }
    }

    /// Send a user message through one conversation turn
    ///
    /// Preconditions: input non-blank and no turn in flight; otherwise the
    /// call is a no-op. On success the reply is appended after the
    /// configured thinking delay; on failure an error bubble is surfaced
    /// instead and the session returns to idle.
    pub async fn send_message(&self, input: &str) -> anyhow::Result<()> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(());
        }

        // Claim the turn and route under one lock so the pending question
        // cannot change between the decision and the call.
        let (user_msg, pending) = {
            let mut session = self.session.lock();
            if !session.begin_turn() {
                return Ok(());
            }
            let id = session.push_user(input.to_string());
            (id, session.take_pending_question())
        };

        self.send(GuideMessage::Message {
            id: user_msg,
            role: MessageRole::User,
            text: input.to_string(),
        })
        .await;
        self.send(GuideMessage::Typing { active: true }).await;

        let context = self.context.lock().clone();
        let result = match &pending {
            Some(question) => {
                let dream_id = context.as_ref().map_or(1, DreamContext::dream_id);
                tracing::debug!(dream_id, "routing input as follow-up answer");
                self.backend
                    .followup(dream_id, question, input, context.as_ref())
                    .await
            }
            None => {
                tracing::debug!(page = %self.config.page, "routing input as fresh turn");
                self.backend
                    .respond(&self.config.page, input, context.as_ref())
                    .await
            }
        };

        // Perceived-thinking delay applies to failures too, so the typing
        // indicator never flickers.
        if self.config.thinking_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.thinking_delay_ms)).await;
        }

        self.send(GuideMessage::Typing { active: false }).await;

        match result {
            Ok(reply) => self.deliver_reply(reply).await,
            Err(e) => {
                self.session.lock().finish_turn();
                tracing::warn!(error = %e, "chat turn failed");
                self.send(GuideMessage::TurnFailed {
                    error: e.to_string(),
                })
                .await;
            }
        }

        Ok(())
    }

    /// Append a reply to the session and surface it
    async fn deliver_reply(&self, reply: TurnReply) {
        let bot_msg = {
            let mut session = self.session.lock();
            session.finish_turn();
            let id = session.push_bot(reply.response.clone());
            if reply.is_question() {
                session.set_pending_question(reply.response.clone());
            }
            id
        };

        self.send(GuideMessage::Message {
            id: bot_msg,
            role: MessageRole::Bot,
            text: reply.response.clone(),
        })
        .await;

        if reply.is_question() {
            self.send(GuideMessage::PendingQuestion {
                question: reply.response,
            })
            .await;
        }
    }

    /// Prime the chat for a freshly analyzed dream
    ///
    /// Resets the transcript to a single invitation and points follow-up
    /// routing at the given record.
    pub async fn prime_for_dream(&self, record: &DreamRecord) {
        self.set_dream_context(Some(DreamContext::from(record)));
        let msg_id = self.session.lock().prime(CONTEXT_INVITATION.to_string());

        self.send(GuideMessage::ConversationReset).await;
        self.send(GuideMessage::Message {
            id: msg_id,
            role: MessageRole::Bot,
            text: CONTEXT_INVITATION.to_string(),
        })
        .await;
    }

    /// Send a notification to the surface
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(GuideMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: GuideMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
