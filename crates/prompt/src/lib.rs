//! Prompt composition and email helpers for Scribe.
//!
//! The composer renders the fixed-order drafting prompt (system
//! instructions, bounded history, retrieved context, draft under
//! refinement, current request); the email module provides the canonical
//! draft layout, lenient part parsing, starter templates, and persistence
//! of accepted drafts.

pub mod composer;
pub mod email;
pub mod types;

// Re-export main types
pub use composer::compose;
pub use email::{
    email_template, format_email, parse_email_parts, save_draft, EmailParts, EmailTemplateKind,
};
pub use types::{ComposeRequest, ComposedPrompt, HistoryTurn, Speaker};
