//! The drafting agent for Scribe.
//!
//! Each session is an explicit state machine driven one turn at a time:
//! classify the message, retrieve context when needed, compose the prompt,
//! generate the draft, then wait for feedback. The session manager layers
//! lifecycle (start, accept, close, cancel) and per-session serialization
//! on top, so many sessions can run turns concurrently over one shared
//! index and provider.

pub mod classify;
pub mod manager;
pub mod orchestrator;
pub mod state;

// Re-export main types
pub use classify::{create_policy, AlwaysRetrieve, KeywordPolicy, RetrievalPolicy};
pub use manager::SessionManager;
pub use orchestrator::{DraftReply, Orchestrator, OrchestratorConfig, Session};
pub use state::{ConversationState, SessionState, Turn};
