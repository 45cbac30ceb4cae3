//! Command handlers for the Scribe CLI.

mod ask;
mod chat;
mod forget;
mod ingest;
mod stats;
mod template;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use forget::ForgetCommand;
pub use ingest::IngestCommand;
pub use stats::StatsCommand;
pub use template::TemplateCommand;

use scribe_agent::{create_policy, Orchestrator, OrchestratorConfig, SessionManager};
use scribe_core::{config::AppConfig, AppResult};
use scribe_knowledge::{load_index, IndexStore, Indexer, Retriever, SharedIndex};
use scribe_llm::{create_embedding_provider, create_generation_client};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Open (or create) the persistent index store under .scribe/.
pub(crate) fn open_store(config: &AppConfig) -> AppResult<Arc<Mutex<IndexStore>>> {
    let store = IndexStore::open(&config.index_db_path())?;
    Ok(Arc::new(Mutex::new(store)))
}

/// Rebuild the shared in-memory index from the persistent store.
pub(crate) fn load_shared_index(
    store: &Arc<Mutex<IndexStore>>,
    dimensions: usize,
) -> AppResult<SharedIndex> {
    let index = {
        let store = store.lock().unwrap_or_else(|e| e.into_inner());
        load_index(&store, dimensions)?
    };
    tracing::debug!("Loaded {} chunks from the index store", index.len());
    Ok(Arc::new(RwLock::new(index)))
}

/// Build an indexer backed by the persistent store.
pub(crate) fn build_indexer(
    config: &AppConfig,
    store: Arc<Mutex<IndexStore>>,
    index: SharedIndex,
) -> AppResult<Indexer> {
    let embedder = create_embedding_provider(
        &config.embedding_provider,
        config.endpoint.as_deref(),
        &config.embedding_model,
        config.indexing.embedding_dim,
        config.timeout(),
    )?;
    Ok(Indexer::new(
        embedder,
        index,
        config.indexing.chunk_size,
        config.indexing.chunk_overlap,
    )
    .with_store(store))
}

/// Assemble the drafting stack: providers, retriever, orchestrator, manager.
pub(crate) fn build_manager(config: &AppConfig, index: SharedIndex) -> AppResult<SessionManager> {
    let generator = create_generation_client(
        &config.provider,
        config.endpoint.as_deref(),
        config.timeout(),
    )?;
    let embedder = create_embedding_provider(
        &config.embedding_provider,
        config.endpoint.as_deref(),
        &config.embedding_model,
        config.indexing.embedding_dim,
        config.timeout(),
    )?;
    let retriever = Arc::new(Retriever::new(embedder, index));
    let policy = create_policy(&config.conversation.retrieval_policy)?;

    let orchestrator = Arc::new(Orchestrator::new(
        generator,
        retriever,
        policy,
        OrchestratorConfig {
            model: config.model.clone(),
            top_k: config.indexing.top_k,
            history_window: config.conversation.history_window,
            max_tokens: config.conversation.max_tokens,
        },
    ));
    Ok(SessionManager::new(orchestrator))
}
