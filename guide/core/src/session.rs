//! Chat Session State
//!
//! Holds the conversation with the REMinder guide: the ordered message
//! transcript, the open/closed panel flag, the pending follow-up question,
//! and the turn state machine.
//!
//! # Design Philosophy
//!
//! The session is shared by every consumer of the chat feature (the chat
//! button, the panel, the analyzer page that primes context). Mutation is
//! funneled through a small set of named operations rather than arbitrary
//! setters, so the pending-question invariant - at most one outstanding
//! question at a time - is enforced in exactly one place.
//!
//! Messages are append-only and live only for the process lifetime; there is
//! no persistence. [`ChatSession::reset`] is the page-reload analog.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::messages::{MessageId, MessageRole};

/// A chat session shared across consumers, serialized by the lock
pub type SharedSession = Arc<Mutex<ChatSession>>;

/// A message in the chat transcript
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Message content
    pub text: String,
}

impl ChatMessage {
    /// Create a new message
    pub fn new(role: MessageRole, text: String) -> Self {
        Self {
            id: MessageId::new(),
            role,
            text,
        }
    }
}

/// Turn state machine for the chat flow
///
/// `Idle -> AwaitingResponse -> Idle`. The flag is advisory: a send attempted
/// while a turn is in flight is dropped by the precondition check, never
/// queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    /// Ready for the next user message
    Idle,
    /// A turn is in flight; further sends are rejected
    AwaitingResponse,
}

/// Conversation state for one chat session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatSession {
    /// Whether the chat panel is open
    open: bool,
    /// Ordered, append-only transcript
    messages: Vec<ChatMessage>,
    /// Outstanding follow-up question, if the guide's last reply was one
    pending_question: Option<String>,
    /// Turn state
    turn_state: TurnState,
}

impl ChatSession {
    /// Create a new, empty session (panel closed, idle)
    pub fn new() -> Self {
        Self {
            open: false,
            messages: Vec::new(),
            pending_question: None,
            turn_state: TurnState::Idle,
        }
    }

    /// Create a shared handle to a fresh session
    pub fn shared() -> SharedSession {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Toggle the panel open/closed
    pub fn toggle_open(&mut self) {
        self.open = !self.open;
    }

    /// Whether the panel is open
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Append a user message
    pub fn push_user(&mut self, text: String) -> MessageId {
        let msg = ChatMessage::new(MessageRole::User, text);
        let id = msg.id.clone();
        self.messages.push(msg);
        id
    }

    /// Append a guide (bot) message
    pub fn push_bot(&mut self, text: String) -> MessageId {
        let msg = ChatMessage::new(MessageRole::Bot, text);
        let id = msg.id.clone();
        self.messages.push(msg);
        id
    }

    /// The full transcript, in append order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages in the transcript
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Begin a turn: `Idle -> AwaitingResponse`
    ///
    /// Returns false (and changes nothing) if a turn is already in flight.
    pub fn begin_turn(&mut self) -> bool {
        match self.turn_state {
            TurnState::Idle => {
                self.turn_state = TurnState::AwaitingResponse;
                true
            }
            TurnState::AwaitingResponse => {
                tracing::debug!("begin_turn rejected: turn already in flight");
                false
            }
        }
    }

    /// Finish a turn: `AwaitingResponse -> Idle`
    pub fn finish_turn(&mut self) {
        if self.turn_state != TurnState::AwaitingResponse {
            tracing::warn!(state = ?self.turn_state, "finish_turn outside AwaitingResponse");
        }
        self.turn_state = TurnState::Idle;
    }

    /// Current turn state
    pub fn turn_state(&self) -> TurnState {
        self.turn_state
    }

    /// Whether a turn is in flight (the typing indicator mirror)
    pub fn is_awaiting(&self) -> bool {
        self.turn_state == TurnState::AwaitingResponse
    }

    /// Record a follow-up question from the guide's last reply
    ///
    /// Returns false if a question is already outstanding; the existing one
    /// is kept. The controller always takes the old question before a new
    /// one can arrive, so a rejection here indicates a logic error upstream.
    pub fn set_pending_question(&mut self, question: String) -> bool {
        if self.pending_question.is_some() {
            tracing::warn!("rejected second pending question");
            return false;
        }
        self.pending_question = Some(question);
        true
    }

    /// Take the outstanding question, clearing it
    pub fn take_pending_question(&mut self) -> Option<String> {
        self.pending_question.take()
    }

    /// The outstanding question, if any
    pub fn pending_question(&self) -> Option<&str> {
        self.pending_question.as_deref()
    }

    /// Clear the transcript and all turn state (the page-reload analog)
    pub fn reset(&mut self) {
        self.messages.clear();
        self.pending_question = None;
        self.turn_state = TurnState::Idle;
    }

    /// Replace the transcript with a single bot invitation
    ///
    /// Used to prime the chat with context when the analyzed-dream list
    /// refreshes. Any outstanding question is dropped with the transcript.
    pub fn prime(&mut self, invitation: String) -> MessageId {
        self.reset();
        self.push_bot(invitation)
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle_and_closed() {
        let session = ChatSession::new();
        assert!(!session.is_open());
        assert!(session.messages().is_empty());
        assert_eq!(session.turn_state(), TurnState::Idle);
        assert!(session.pending_question().is_none());
    }

    #[test]
    fn test_messages_append_in_order() {
        let mut session = ChatSession::new();
        session.push_user("hi".to_string());
        session.push_bot("hello".to_string());
        session.push_user("how are you".to_string());

        let roles: Vec<_> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Bot, MessageRole::User]
        );
    }

    #[test]
    fn test_turn_gate_rejects_second_send() {
        let mut session = ChatSession::new();
        assert!(session.begin_turn());
        assert!(!session.begin_turn());
        assert_eq!(session.turn_state(), TurnState::AwaitingResponse);

        session.finish_turn();
        assert!(session.begin_turn());
    }

    #[test]
    fn test_at_most_one_pending_question() {
        let mut session = ChatSession::new();
        assert!(session.set_pending_question("What did the water feel like?".to_string()));
        assert!(!session.set_pending_question("Another?".to_string()));
        assert_eq!(
            session.pending_question(),
            Some("What did the water feel like?")
        );

        let taken = session.take_pending_question();
        assert_eq!(taken.as_deref(), Some("What did the water feel like?"));
        assert!(session.pending_question().is_none());
        assert!(session.set_pending_question("Another?".to_string()));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = ChatSession::new();
        session.push_user("hi".to_string());
        session.set_pending_question("q".to_string());
        session.begin_turn();

        session.reset();
        assert!(session.messages().is_empty());
        assert!(session.pending_question().is_none());
        assert_eq!(session.turn_state(), TurnState::Idle);
    }

    #[test]
    fn test_prime_replaces_transcript_with_invitation() {
        let mut session = ChatSession::new();
        session.push_user("old".to_string());
        session.set_pending_question("old question".to_string());

        session.prime("Ask me about this dream.".to_string());
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.messages()[0].role, MessageRole::Bot);
        assert_eq!(session.messages()[0].text, "Ask me about this dream.");
        assert!(session.pending_question().is_none());
    }

    #[test]
    fn test_toggle_open() {
        let mut session = ChatSession::new();
        session.toggle_open();
        assert!(session.is_open());
        session.toggle_open();
        assert!(!session.is_open());
    }
}
