//! Prompt composition types.

use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("User"),
            Self::Agent => f.write_str("Assistant"),
        }
    }
}

/// One prior turn carried into a composed prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub speaker: Speaker,
    pub content: String,
}

/// Everything that goes into one composed prompt.
///
/// Assembly order is fixed (history oldest-first, then retrieved context,
/// then the previous draft when refining, then the current request), so
/// the same input always renders the same prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeRequest {
    /// Prior turns, oldest first, already bounded to the history window
    pub history: Vec<HistoryTurn>,

    /// Retrieved context block with source attribution (None when the
    /// turn needed no retrieval or retrieval was degraded)
    pub retrieved_context: Option<String>,

    /// The draft under refinement, if any
    pub previous_draft: Option<String>,

    /// The latest user message
    pub current_request: String,
}

/// A fully composed prompt ready for the generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedPrompt {
    /// System instructions
    pub system: String,

    /// User message body
    pub user: String,
}
