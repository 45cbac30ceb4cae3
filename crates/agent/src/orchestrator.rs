//! The turn orchestrator: drives one session's state machine through a
//! single exchange.
//!
//! Control flow per turn: classify -> (retrieve) -> compose -> generate.
//! Failure handling follows the session contract:
//! - a retrieval embedding failure degrades the turn (empty context,
//!   `degraded` flag) instead of aborting it;
//! - a generation failure rolls the session back to the state it held when
//!   the message arrived, without appending to the conversation;
//! - cancellation returns the session to `AwaitingQuery`, also without
//!   appending.

use crate::classify::RetrievalPolicy;
use crate::state::{ConversationState, SessionState, Turn};
use scribe_core::{AppError, AppResult};
use scribe_knowledge::{context_block, Chunk, RetrievalResult, Retriever};
use scribe_llm::{GenerationClient, GenerationRequest};
use scribe_prompt::{compose, ComposeRequest};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Notify;
use uuid::Uuid;

/// Tunables for the orchestrator, derived from application config.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Generation model identifier
    pub model: String,

    /// Chunks retrieved per turn
    pub top_k: usize,

    /// Prior exchanges carried into each composed prompt
    pub history_window: usize,

    /// Maximum tokens per generated draft
    pub max_tokens: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: "llama3.2".to_string(),
            top_k: 4,
            history_window: 6,
            max_tokens: 1024,
        }
    }
}

/// The agent's reply for one successful exchange.
#[derive(Debug, Clone, Serialize)]
pub struct DraftReply {
    /// The generated draft
    pub draft_text: String,

    /// Source documents the retrieved context came from, deduplicated,
    /// in retrieval order
    pub retrieved_sources: Vec<String>,

    /// True when retrieval failed and the draft was generated without
    /// reference context
    pub degraded: bool,
}

/// One drafting session: state machine position plus conversation history.
pub struct Session {
    pub id: Uuid,
    pub state: SessionState,
    pub conversation: ConversationState,
    cancel: Arc<Notify>,
}

impl Session {
    /// Create a fresh session sharing the given cancellation handle.
    pub fn new(cancel: Arc<Notify>) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::AwaitingQuery,
            conversation: ConversationState::new(),
            cancel,
        }
    }
}

/// Drives session state machines. Holds no per-session state itself, so a
/// single orchestrator serves any number of concurrent sessions.
pub struct Orchestrator {
    generator: Arc<dyn GenerationClient>,
    retriever: Arc<Retriever>,
    policy: Arc<dyn RetrievalPolicy>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn GenerationClient>,
        retriever: Arc<Retriever>,
        policy: Arc<dyn RetrievalPolicy>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            generator,
            retriever,
            policy,
            config,
        }
    }

    /// Advance the session along a legal edge of the transition table.
    fn transition(&self, session: &mut Session, next: SessionState) -> AppResult<()> {
        if !session.state.can_transition_to(next) {
            return Err(AppError::Other(format!(
                "Illegal session transition: {} -> {}",
                session.state, next
            )));
        }
        tracing::debug!("session {}: {} -> {}", session.id, session.state, next);
        session.state = next;
        Ok(())
    }

    /// Reset the session as if the in-flight turn never happened.
    fn rollback(&self, session: &mut Session, to: SessionState) {
        tracing::debug!("session {}: rollback {} -> {}", session.id, session.state, to);
        session.state = to;
    }

    /// Process one user message through a full turn.
    ///
    /// On success the conversation grows by exactly one turn and the
    /// session lands in `AwaitingFeedback`. On failure or cancellation the
    /// conversation is untouched.
    pub async fn run_turn(&self, session: &mut Session, message: &str) -> AppResult<DraftReply> {
        if session.state.is_terminal() {
            return Err(AppError::SessionClosed(session.id));
        }
        if !session.state.accepts_message() {
            return Err(AppError::Other(format!(
                "Session {} cannot accept a message while {}",
                session.id, session.state
            )));
        }

        let entry_state = session.state;
        let refining = entry_state == SessionState::AwaitingFeedback;

        // One cancellation future armed for the whole turn: a cancel that
        // lands between awaits (or before the first one) is still observed
        // at the next suspension point instead of being lost.
        let cancel = session.cancel.clone();
        let mut cancelled = std::pin::pin!(cancel.notified());
        cancelled.as_mut().enable();

        // Classify and retrieve. Refinement turns skip both: they edit the
        // previous draft rather than answering a new question.
        let (retrieved, degraded): (RetrievalResult, bool) = if refining {
            (Vec::new(), false)
        } else {
            self.transition(session, SessionState::Classifying)?;
            let needs_retrieval = self.policy.needs_retrieval(message);
            tracing::debug!(
                "session {}: policy '{}' -> retrieval {}",
                session.id,
                self.policy.name(),
                if needs_retrieval { "needed" } else { "not needed" }
            );

            if needs_retrieval {
                self.transition(session, SessionState::Retrieving)?;

                let outcome = tokio::select! {
                    _ = cancelled.as_mut() => {
                        tracing::info!("session {}: retrieval cancelled", session.id);
                        self.rollback(session, SessionState::AwaitingQuery);
                        return Err(AppError::Cancelled);
                    }
                    outcome = self.retriever.retrieve(message, self.config.top_k) => outcome,
                };

                match outcome {
                    Ok(results) => (results, false),
                    Err(err @ AppError::Embedding { .. }) => {
                        // Degrade the turn rather than aborting the session
                        tracing::warn!(
                            "session {}: retrieval degraded: {}",
                            session.id,
                            err
                        );
                        (Vec::new(), true)
                    }
                    Err(err) => {
                        self.rollback(session, entry_state);
                        return Err(err);
                    }
                }
            } else {
                (Vec::new(), false)
            }
        };

        // Compose
        self.transition(session, SessionState::Composing)?;
        let previous_draft = if refining {
            session.conversation.last_draft().map(str::to_string)
        } else {
            None
        };
        let retrieved_context = if retrieved.is_empty() {
            None
        } else {
            Some(context_block(&retrieved))
        };
        let compose_request = ComposeRequest {
            history: session
                .conversation
                .history_view(self.config.history_window),
            retrieved_context,
            previous_draft,
            current_request: message.to_string(),
        };
        let prompt = match compose(&compose_request) {
            Ok(prompt) => prompt,
            Err(err) => {
                self.rollback(session, entry_state);
                return Err(err);
            }
        };

        // Generate
        self.transition(session, SessionState::Generating)?;
        let request = GenerationRequest::new(prompt.user, self.config.model.clone())
            .with_system(prompt.system)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(0.7);

        let generated = tokio::select! {
            _ = cancelled.as_mut() => {
                tracing::info!("session {}: generation cancelled", session.id);
                self.rollback(session, SessionState::AwaitingQuery);
                return Err(AppError::Cancelled);
            }
            generated = self.generator.generate(&request) => generated,
        };

        let response = match generated {
            Ok(response) => response,
            Err(err) => {
                // The turn never happened: conversation untouched, state
                // restored so the session stays resumable
                tracing::warn!("session {}: generation failed: {}", session.id, err);
                self.rollback(session, entry_state);
                return Err(err);
            }
        };

        let chunks: Vec<Chunk> = retrieved.into_iter().map(|scored| scored.chunk).collect();
        let retrieved_sources = dedup_sources(&chunks);
        session.conversation.push(Turn {
            request: message.to_string(),
            draft: response.content.clone(),
            retrieved_chunks: chunks,
            degraded,
        });
        self.transition(session, SessionState::AwaitingFeedback)?;

        Ok(DraftReply {
            draft_text: response.content,
            retrieved_sources,
            degraded,
        })
    }
}

/// Deduplicate source ids, preserving retrieval order.
fn dedup_sources(chunks: &[Chunk]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut sources = Vec::new();
    for chunk in chunks {
        if seen.insert(chunk.source_id.as_str()) {
            sources.push(chunk.source_id.clone());
        }
    }
    sources
}
