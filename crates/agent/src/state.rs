//! Session state machine and conversation state.
//!
//! The drafting workflow is an explicit, enumerable state machine with a
//! fixed transition table: a `match` over a closed set of states, not a
//! runtime-typed graph.

use scribe_knowledge::Chunk;
use scribe_prompt::{HistoryTurn, Speaker};
use serde::Serialize;

/// States of one drafting session.
///
/// ```text
/// AwaitingQuery -> Classifying -> (Retrieving) -> Composing -> Generating
///     -> AwaitingFeedback -> (refine: back to Composing) -> Done
/// ```
///
/// `Done` is terminal and reached only by explicit caller action (accept
/// or close). Cancellation and generation failure return the session to
/// the state it held when the message arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AwaitingQuery,
    Classifying,
    Retrieving,
    Composing,
    Generating,
    AwaitingFeedback,
    Done,
}

impl SessionState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (AwaitingQuery, Classifying) => true,
            (Classifying, Retrieving) => true,
            (Classifying, Composing) => true,
            (Retrieving, Composing) => true,
            // Cancellation of a pending step
            (Retrieving, AwaitingQuery) | (Generating, AwaitingQuery) => true,
            (Composing, Generating) => true,
            // Success, or rollback after a failed refinement generation
            (Generating, AwaitingFeedback) => true,
            // Refinement skips classification
            (AwaitingFeedback, Composing) => true,
            // Explicit accept/close
            (AwaitingQuery, Done) | (AwaitingFeedback, Done) => true,
            _ => false,
        }
    }

    /// Whether the session can accept a new user message in this state.
    pub fn accepts_message(self) -> bool {
        matches!(self, Self::AwaitingQuery | Self::AwaitingFeedback)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingQuery => "awaiting_query",
            Self::Classifying => "classifying",
            Self::Retrieving => "retrieving",
            Self::Composing => "composing",
            Self::Generating => "generating",
            Self::AwaitingFeedback => "awaiting_feedback",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// One completed exchange: a user message paired with the agent's draft.
#[derive(Debug, Clone)]
pub struct Turn {
    /// The user's message for this turn
    pub request: String,

    /// The draft the agent produced
    pub draft: String,

    /// Chunks retrieved for this turn (possibly empty)
    pub retrieved_chunks: Vec<Chunk>,

    /// True when retrieval failed and the turn proceeded without context
    pub degraded: bool,
}

/// Append-only, totally ordered conversation history for one session.
///
/// Turns are only ever appended, and only after a successful generation;
/// a failed or cancelled turn leaves the conversation untouched.
#[derive(Debug, Default)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent draft, if any.
    pub fn last_draft(&self) -> Option<&str> {
        self.turns.last().map(|t| t.draft.as_str())
    }

    /// Flatten the most recent `window` exchanges into speaker-tagged
    /// history turns, oldest first, for prompt composition.
    pub fn history_view(&self, window: usize) -> Vec<HistoryTurn> {
        let start = self.turns.len().saturating_sub(window);
        self.turns[start..]
            .iter()
            .flat_map(|turn| {
                [
                    HistoryTurn {
                        speaker: Speaker::User,
                        content: turn.request.clone(),
                    },
                    HistoryTurn {
                        speaker: Speaker::Agent,
                        content: turn.draft.clone(),
                    },
                ]
            })
            .collect()
    }
}
