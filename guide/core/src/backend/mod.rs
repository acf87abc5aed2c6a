//! Journal Backend Abstraction
//!
//! Trait-based seam between the Guide core and the external REMinder
//! service. See [`traits`] for the contract and [`http`] for the reqwest
//! implementation.

pub mod http;
pub mod traits;

pub use http::HttpJournalBackend;
pub use traits::{BackendError, DreamContext, JournalBackend, ReplyKind, TurnReply};
