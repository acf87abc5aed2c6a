//! Guide Messages
//!
//! Messages sent from the Guide core to UI surfaces. These represent all the
//! ways the client core can communicate with a connected UI (TUI, desktop
//! shell, test harness, etc.).
//!
//! # Design Philosophy
//!
//! The Guide decides what happens in a conversation; surfaces are pure
//! renderers that display what the Guide tells them to. Chat bubbles, the
//! typing indicator, and error bubbles all arrive through this channel, so a
//! surface never has to reach into turn-taking logic to stay in sync.

use serde::{Deserialize, Serialize};

/// Messages from the Guide to a UI surface
///
/// These messages tell the UI what to display. The UI should not have any
/// business logic - just render what it's told.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GuideMessage {
    /// A complete chat bubble to display
    Message {
        /// Unique message ID for tracking
        id: MessageId,
        /// Who sent this message
        role: MessageRole,
        /// The message content
        text: String,
    },

    /// Typing indicator state ("REMinder is thinking...")
    Typing {
        /// Whether the indicator should be shown
        active: bool,
    },

    /// A turn failed; the surface should show an error bubble
    TurnFailed {
        /// Error description from the backend or transport
        error: String,
    },

    /// The assistant's last reply was a question awaiting an answer
    ///
    /// Purely informational: the routing itself happens inside the session.
    PendingQuestion {
        /// The question text
        question: String,
    },

    /// The conversation was reset (context priming, explicit clear)
    ConversationReset,

    /// System notification outside the chat transcript
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },
}

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Who sent a chat message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// The REMinder guide (assistant)
    Bot,
    /// System message (status, priming)
    System,
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}
