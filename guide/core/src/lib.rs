//! Guide Core - Headless Dream Journal Orchestration for REMinder
//!
//! This crate provides the client-side logic of the REMinder dream journal,
//! completely independent of any UI framework. It can drive a TUI, web UI,
//! native GUI, or run headless for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                     UI Surfaces                        │
//! │      ┌─────────┐   ┌─────────┐   ┌────────────────┐    │
//! │      │   TUI   │   │  WebUI  │   │    Headless    │    │
//! │      │(ratatui)│   │         │   │                │    │
//! │      └────┬────┘   └────┬────┘   └───────┬────────┘    │
//! │           └─────────────┴────────────────┘             │
//! │                         │                              │
//! │                 GuideMessage (down)                    │
//! │                         │                              │
//! └─────────────────────────┼──────────────────────────────┘
//!                           │
//! ┌─────────────────────────┼──────────────────────────────┐
//! │                    GUIDE CORE                          │
//! │  ┌──────────────────────┴───────────────────────────┐  │
//! │  │                     Guide                        │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────┐  │  │
//! │  │  │  Chat   │ │  Cards  │ │ Gallery │ │Backend │  │  │
//! │  │  │ Session │ │ /Parser │ │ /Speech │ │ (HTTP) │  │  │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └────────┘  │  │
//! │  └──────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Guide`]: The chat turn controller driving the DreamAnalyzer guide
//! - [`GuideMessage`]: Messages sent from the Guide to UI surfaces
//! - [`ChatSession`]: Conversation state with the pending-question invariant
//! - [`JournalBackend`]: The dream journal HTTP backend abstraction
//! - [`DreamCard`]: Fully formatted dream card view models
//! - [`Gallery`]: The dream image gallery controller
//! - [`TranscriptCapture`]: Speech-to-dream-text capture state machine
//!
//! # Module Overview
//!
//! - [`backend`]: Journal backend abstraction and the HTTP implementation
//! - [`cards`]: Dream card view models and expansion state
//! - [`config`]: TOML + environment configuration
//! - [`dream`]: Dream records and metric formatting
//! - [`gallery`]: Image gallery controller
//! - [`guide`]: The chat turn controller
//! - [`interpretation`]: Interpretation text block parser
//! - [`messages`]: Messages from the Guide to UI surfaces
//! - [`session`]: Chat session state
//! - [`speech`]: Speech capture adapter
//! - [`store`]: Login token and profile persistence
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework. It's pure business logic that can be used anywhere.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod cards;
pub mod config;
pub mod dream;
pub mod gallery;
pub mod guide;
pub mod interpretation;
pub mod messages;
pub mod session;
pub mod speech;
pub mod store;

// Re-exports for convenience
pub use backend::{
    BackendError, DreamContext, HttpJournalBackend, JournalBackend, ReplyKind, TurnReply,
};
pub use cards::{build_cards, symbol_bars, CardKey, CardList, DreamCard, SymbolBar};
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, GuideConfig, GuideToml,
};
pub use dream::{
    trauma_level, Confidence, DreamRecord, EmotionalArc, TraumaLevel, PLACEHOLDER,
    TRAUMA_ELEVATED_THRESHOLD,
};
pub use gallery::{Gallery, GalleryState};
pub use guide::{Guide, CONTEXT_INVITATION};
pub use interpretation::{parse_blocks, InterpretationBlock};
pub use messages::{GuideMessage, MessageId, MessageRole, NotifyLevel};
pub use session::{ChatMessage, ChatSession, SharedSession, TurnState};
pub use speech::{
    run_capture, CaptureAction, CaptureState, RecognizerEvent, RecognizerResult, SpeechRecognizer,
    TranscriptCapture,
};
pub use store::{Profile, ProfileStore, StoreError};
