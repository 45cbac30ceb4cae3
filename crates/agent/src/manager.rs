//! Session lifecycle management.
//!
//! The manager owns the session table and serializes turns per session: a
//! `tokio::sync::Mutex` around each session means a second message for the
//! same session waits for the in-flight turn, while different sessions run
//! their turns concurrently. The cancellation handle lives outside that
//! mutex so `cancel` can fire while a turn holds the lock.

use crate::orchestrator::{DraftReply, Orchestrator, Session};
use crate::state::SessionState;
use scribe_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};
use uuid::Uuid;

struct SessionSlot {
    cancel: Arc<Notify>,
    inner: Mutex<Session>,
}

/// Manages concurrent drafting sessions over a shared orchestrator.
pub struct SessionManager {
    orchestrator: Arc<Orchestrator>,
    sessions: RwLock<HashMap<Uuid, Arc<SessionSlot>>>,
}

impl SessionManager {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, id: Uuid) -> AppResult<Arc<SessionSlot>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .cloned()
            .ok_or(AppError::SessionNotFound(id))
    }

    /// Open a new session in `AwaitingQuery`.
    pub async fn start_session(&self) -> Uuid {
        let cancel = Arc::new(Notify::new());
        let session = Session::new(cancel.clone());
        let id = session.id;

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id,
            Arc::new(SessionSlot {
                cancel,
                inner: Mutex::new(session),
            }),
        );
        tracing::info!("session {}: started", id);
        id
    }

    /// Run one turn for the session. Waits if a turn is already in flight.
    pub async fn send_message(&self, id: Uuid, message: &str) -> AppResult<DraftReply> {
        let slot = self.slot(id).await?;
        let mut session = slot.inner.lock().await;
        self.orchestrator.run_turn(&mut session, message).await
    }

    /// Accept the pending draft, closing the session.
    pub async fn accept_draft(&self, id: Uuid) -> AppResult<()> {
        let slot = self.slot(id).await?;
        let mut session = slot.inner.lock().await;
        match session.state {
            SessionState::AwaitingFeedback => {
                tracing::info!("session {}: draft accepted", id);
                session.state = SessionState::Done;
                Ok(())
            }
            SessionState::Done => Err(AppError::SessionClosed(id)),
            other => Err(AppError::Other(format!(
                "Session {} has no draft to accept while {}",
                id, other
            ))),
        }
    }

    /// Close the session. Idempotent: closing a closed session is a no-op.
    pub async fn close_session(&self, id: Uuid) -> AppResult<()> {
        let slot = self.slot(id).await?;
        let mut session = slot.inner.lock().await;
        if session.state != SessionState::Done {
            tracing::info!("session {}: closed from {}", id, session.state);
            session.state = SessionState::Done;
        }
        Ok(())
    }

    /// Cancel the session's in-flight turn, if any.
    ///
    /// Signals without waiting: the turn arms its cancellation future on
    /// entry, so a signal sent at any point during the turn is observed at
    /// the next suspension point and surfaces as `Cancelled`. With no turn
    /// in flight the signal is a no-op.
    pub async fn cancel(&self, id: Uuid) -> AppResult<()> {
        let slot = self.slot(id).await?;
        tracing::info!("session {}: cancellation requested", id);
        slot.cancel.notify_waiters();
        Ok(())
    }

    pub async fn state(&self, id: Uuid) -> AppResult<SessionState> {
        let slot = self.slot(id).await?;
        let session = slot.inner.lock().await;
        Ok(session.state)
    }

    /// Number of completed exchanges in the session's conversation.
    pub async fn turn_count(&self, id: Uuid) -> AppResult<usize> {
        let slot = self.slot(id).await?;
        let session = slot.inner.lock().await;
        Ok(session.conversation.len())
    }

    /// The most recent draft, if the session has produced one.
    pub async fn last_draft(&self, id: Uuid) -> AppResult<Option<String>> {
        let slot = self.slot(id).await?;
        let session = slot.inner.lock().await;
        Ok(session.conversation.last_draft().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{AlwaysRetrieve, KeywordPolicy};
    use crate::orchestrator::OrchestratorConfig;
    use scribe_core::FailureKind;
    use scribe_knowledge::{Indexer, Retriever, SharedIndex, VectorIndex};
    use scribe_llm::providers::{FailingEmbedder, TrigramEmbedder};
    use scribe_llm::{EmbeddingProvider, GenerationClient, MockGenerationClient};
    use std::time::Duration;

    const DIM: usize = 128;

    async fn build_manager(
        generator: MockGenerationClient,
        embedder: Arc<dyn EmbeddingProvider>,
        documents: &[(&str, &str)],
    ) -> SessionManager {
        let index: SharedIndex = Arc::new(RwLock::new(VectorIndex::new(DIM)));
        if !documents.is_empty() {
            let indexer = Indexer::new(Arc::new(TrigramEmbedder::new(DIM)), index.clone(), 200, 40);
            for (source_id, text) in documents {
                indexer.submit_document(source_id, text).await.unwrap();
            }
        }

        let retriever = Arc::new(Retriever::new(embedder, index));
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(generator) as Arc<dyn GenerationClient>,
            retriever,
            Arc::new(KeywordPolicy),
            OrchestratorConfig::default(),
        ));
        SessionManager::new(orchestrator)
    }

    #[tokio::test]
    async fn test_happy_path_draft_with_retrieval() {
        let manager = build_manager(
            MockGenerationClient::new().with_response("Subject: Budget update\n\nThe Q3 budget was approved."),
            Arc::new(TrigramEmbedder::new(DIM)),
            &[
                ("notes.txt", "Meeting notes: budget approved for Q3, deadline June 1."),
                ("menu.txt", "Cafeteria menu: pizza on Friday, salad bar daily."),
            ],
        )
        .await;

        let id = manager.start_session().await;
        assert_eq!(manager.state(id).await.unwrap(), SessionState::AwaitingQuery);

        let reply = manager
            .send_message(id, "Draft an email about what was approved in the meeting?")
            .await
            .unwrap();

        assert!(reply.draft_text.contains("approved"));
        assert!(!reply.degraded);
        assert_eq!(reply.retrieved_sources[0], "notes.txt");
        assert_eq!(manager.state(id).await.unwrap(), SessionState::AwaitingFeedback);
        assert_eq!(manager.turn_count(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_conversation_grows_one_turn_per_exchange() {
        let manager = build_manager(
            MockGenerationClient::new(),
            Arc::new(TrigramEmbedder::new(DIM)),
            &[],
        )
        .await;

        let id = manager.start_session().await;
        manager.send_message(id, "Draft a greeting email.").await.unwrap();
        assert_eq!(manager.turn_count(id).await.unwrap(), 1);
        manager.send_message(id, "Make it shorter.").await.unwrap();
        assert_eq!(manager.turn_count(id).await.unwrap(), 2);
        manager.send_message(id, "Add a signature.").await.unwrap();
        assert_eq!(manager.turn_count(id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_refinement_carries_previous_draft() {
        let manager = build_manager(
            MockGenerationClient::new()
                .with_response("Dear team, the launch is on Friday. Regards.")
                .with_response("Hi team, launch is Friday!"),
            Arc::new(TrigramEmbedder::new(DIM)),
            &[],
        )
        .await;

        let id = manager.start_session().await;
        let first = manager
            .send_message(id, "Draft a launch announcement.")
            .await
            .unwrap();
        assert_eq!(first.draft_text, "Dear team, the launch is on Friday. Regards.");

        // Refinement runs from AwaitingFeedback and skips retrieval
        let second = manager.send_message(id, "Make it more casual.").await.unwrap();
        assert_eq!(second.draft_text, "Hi team, launch is Friday!");
        assert!(second.retrieved_sources.is_empty());
        assert_eq!(
            manager.last_draft(id).await.unwrap().as_deref(),
            Some("Hi team, launch is Friday!")
        );
    }

    #[tokio::test]
    async fn test_degraded_turn_on_embedding_failure() {
        let manager = build_manager(
            MockGenerationClient::new().with_response("Best effort draft."),
            Arc::new(FailingEmbedder::new(DIM, FailureKind::Transport)),
            &[("notes.txt", "budget approved for Q3")],
        )
        .await;

        let id = manager.start_session().await;
        let reply = manager
            .send_message(id, "What was approved in the meeting?")
            .await
            .unwrap();

        assert!(reply.degraded);
        assert!(reply.retrieved_sources.is_empty());
        assert_eq!(reply.draft_text, "Best effort draft.");
        assert_eq!(manager.state(id).await.unwrap(), SessionState::AwaitingFeedback);
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_session_resumable() {
        let manager = build_manager(
            MockGenerationClient::failing(FailureKind::Timeout),
            Arc::new(TrigramEmbedder::new(DIM)),
            &[],
        )
        .await;

        let id = manager.start_session().await;
        let err = manager.send_message(id, "Draft a note.").await.unwrap_err();
        assert!(matches!(err, AppError::Generation { .. }));
        assert!(err.is_transient());

        // The failed turn never happened
        assert_eq!(manager.turn_count(id).await.unwrap(), 0);
        assert_eq!(manager.state(id).await.unwrap(), SessionState::AwaitingQuery);
    }

    #[tokio::test]
    async fn test_refinement_failure_keeps_pending_draft() {
        fn orchestrator_with(generator: MockGenerationClient) -> Orchestrator {
            let index: SharedIndex = Arc::new(RwLock::new(VectorIndex::new(DIM)));
            let retriever = Arc::new(Retriever::new(Arc::new(TrigramEmbedder::new(DIM)), index));
            Orchestrator::new(
                Arc::new(generator) as Arc<dyn GenerationClient>,
                retriever,
                Arc::new(KeywordPolicy),
                OrchestratorConfig::default(),
            )
        }

        let mut session = Session::new(Arc::new(Notify::new()));
        let working = orchestrator_with(MockGenerationClient::new().with_response("First draft."));
        working.run_turn(&mut session, "Draft a note.").await.unwrap();
        assert_eq!(session.state, SessionState::AwaitingFeedback);

        // A failed refinement rolls back to AwaitingFeedback with the
        // previous draft still pending
        let failing = orchestrator_with(MockGenerationClient::failing(FailureKind::Transport));
        let err = failing.run_turn(&mut session, "Shorter.").await.unwrap_err();
        assert!(matches!(err, AppError::Generation { .. }));
        assert_eq!(session.state, SessionState::AwaitingFeedback);
        assert_eq!(session.conversation.len(), 1);
        assert_eq!(session.conversation.last_draft(), Some("First draft."));
    }

    #[tokio::test]
    async fn test_closed_session_rejects_messages() {
        let manager = build_manager(
            MockGenerationClient::new(),
            Arc::new(TrigramEmbedder::new(DIM)),
            &[],
        )
        .await;

        let id = manager.start_session().await;
        manager.send_message(id, "Draft a note.").await.unwrap();
        manager.accept_draft(id).await.unwrap();
        assert_eq!(manager.state(id).await.unwrap(), SessionState::Done);

        let err = manager.send_message(id, "One more thing.").await.unwrap_err();
        assert!(matches!(err, AppError::SessionClosed(eid) if eid == id));
        // Conversation unchanged by the rejected message
        assert_eq!(manager.turn_count(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let manager = build_manager(
            MockGenerationClient::new(),
            Arc::new(TrigramEmbedder::new(DIM)),
            &[],
        )
        .await;

        let id = manager.start_session().await;
        manager.close_session(id).await.unwrap();
        manager.close_session(id).await.unwrap();
        assert_eq!(manager.state(id).await.unwrap(), SessionState::Done);
    }

    #[tokio::test]
    async fn test_accept_without_draft_fails() {
        let manager = build_manager(
            MockGenerationClient::new(),
            Arc::new(TrigramEmbedder::new(DIM)),
            &[],
        )
        .await;

        let id = manager.start_session().await;
        let err = manager.accept_draft(id).await.unwrap_err();
        assert!(matches!(err, AppError::Other(_)));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let manager = build_manager(
            MockGenerationClient::new(),
            Arc::new(TrigramEmbedder::new(DIM)),
            &[],
        )
        .await;

        let err = manager.send_message(Uuid::new_v4(), "hello").await.unwrap_err();
        assert!(matches!(err, AppError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_cancellation_returns_to_awaiting_query() {
        let generator = MockGenerationClient::new()
            .with_response("Slow draft.")
            .with_delay(Duration::from_secs(5));
        let manager = Arc::new(
            build_manager(generator, Arc::new(TrigramEmbedder::new(DIM)), &[]).await,
        );

        let id = manager.start_session().await;

        let turn = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.send_message(id, "Draft a long email.").await })
        };

        // Let the turn reach the generation await, then cancel it
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.cancel(id).await.unwrap();

        let result = turn.await.unwrap();
        assert!(matches!(result, Err(AppError::Cancelled)));
        assert_eq!(manager.state(id).await.unwrap(), SessionState::AwaitingQuery);
        assert_eq!(manager.turn_count(id).await.unwrap(), 0);

        // The session accepts a new message afterwards
        let reply = manager.send_message(id, "Draft a short email.").await.unwrap();
        assert!(!reply.draft_text.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_sessions_are_independent() {
        let index: SharedIndex = Arc::new(RwLock::new(VectorIndex::new(DIM)));
        let retriever = Arc::new(Retriever::new(Arc::new(TrigramEmbedder::new(DIM)), index));
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(MockGenerationClient::new()) as Arc<dyn GenerationClient>,
            retriever,
            Arc::new(AlwaysRetrieve),
            OrchestratorConfig::default(),
        ));
        let manager = Arc::new(SessionManager::new(orchestrator));

        let a = manager.start_session().await;
        let b = manager.start_session().await;

        let ta = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.send_message(a, "Draft email A.").await })
        };
        let tb = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.send_message(b, "Draft email B.").await })
        };

        ta.await.unwrap().unwrap();
        tb.await.unwrap().unwrap();

        assert_eq!(manager.turn_count(a).await.unwrap(), 1);
        assert_eq!(manager.turn_count(b).await.unwrap(), 1);
    }
}
