//! Document ingestion: chunk, embed, and (re)index atomically.

use crate::chunker::chunk_text;
use crate::index::VectorIndex;
use crate::store::IndexStore;
use crate::types::{IndexEntry, SourceRecord};
use chrono::Utc;
use scribe_core::AppResult;
use scribe_llm::EmbeddingProvider;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Shared handle to the vector index.
///
/// Queries take the read lock (concurrent across sessions); inserts and
/// deletes take the write lock. No await happens while a lock is held.
pub type SharedIndex = Arc<RwLock<VectorIndex>>;

/// Ingests documents into the shared vector index.
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    index: SharedIndex,
    store: Option<Arc<Mutex<IndexStore>>>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Indexer {
    /// Create an indexer without persistence.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: SharedIndex,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            store: None,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Attach a persistent store mirrored on every index mutation.
    pub fn with_store(mut self, store: Arc<Mutex<IndexStore>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Index a document, replacing any prior chunks for the same source.
    ///
    /// Atomicity: every chunk is embedded *before* the index is touched.
    /// An embedding failure therefore leaves both the index and the store
    /// exactly as they were, with no partial chunk set ever visible.
    /// Re-submitting identical content yields the identical chunk set
    /// (delete-then-insert, deterministic chunking and ids).
    ///
    /// Returns the number of chunks indexed.
    pub async fn submit_document(&self, source_id: &str, raw_text: &str) -> AppResult<usize> {
        tracing::info!("Indexing document '{}' ({} bytes)", source_id, raw_text.len());

        let chunks = chunk_text(source_id, raw_text, self.chunk_size, self.chunk_overlap)?;
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        // Embed first; any failure aborts before the index is mutated
        let vectors = self.embedder.embed_batch(&texts).await?;

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();
        let chunk_count = entries.len();

        let record = SourceRecord {
            source_id: source_id.to_string(),
            indexed_at: Utc::now(),
            chunk_count,
            byte_count: raw_text.len(),
        };

        {
            let mut index = self.index.write().await;
            let removed = index.delete(source_id);
            if removed > 0 {
                tracing::debug!("Replaced {} prior chunks for '{}'", removed, source_id);
            }
            index.insert(entries.clone())?;
        }

        if let Some(ref store) = self.store {
            let mut store = store.lock().unwrap_or_else(|e| e.into_inner());
            store.replace_source(&record, &entries)?;
        }

        tracing::info!("Indexed '{}' into {} chunks", source_id, chunk_count);
        Ok(chunk_count)
    }

    /// Remove a document's chunks from the index (and store, if attached).
    pub async fn delete_document(&self, source_id: &str) -> AppResult<usize> {
        let removed = {
            let mut index = self.index.write().await;
            index.delete(source_id)
        };

        if let Some(ref store) = self.store {
            let mut store = store.lock().unwrap_or_else(|e| e.into_inner());
            store.delete_source(source_id)?;
        }

        tracing::info!("Removed {} chunks for '{}'", removed, source_id);
        Ok(removed)
    }
}

/// Rebuild an in-memory index from a persistent store.
///
/// A failed integrity check surfaces as `IndexCorruption`; the caller must
/// re-index from source documents rather than retrying the load.
pub fn load_index(store: &IndexStore, dimensions: usize) -> AppResult<VectorIndex> {
    let entries = store.load_entries(dimensions)?;
    let mut index = VectorIndex::new(dimensions);
    index.insert(entries)?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::{AppError, FailureKind};
    use scribe_llm::providers::{FailingEmbedder, TrigramEmbedder};

    fn shared_index(dim: usize) -> SharedIndex {
        Arc::new(RwLock::new(VectorIndex::new(dim)))
    }

    #[tokio::test]
    async fn test_submit_document() {
        let index = shared_index(64);
        let indexer = Indexer::new(Arc::new(TrigramEmbedder::new(64)), index.clone(), 40, 10);

        let count = indexer
            .submit_document("doc1", "Meeting notes: budget approved for Q3, deadline June 1.")
            .await
            .unwrap();

        assert!(count > 0);
        assert_eq!(index.read().await.len(), count);
    }

    #[tokio::test]
    async fn test_reindex_is_idempotent() {
        let index = shared_index(64);
        let indexer = Indexer::new(Arc::new(TrigramEmbedder::new(64)), index.clone(), 40, 10);
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(5);

        let first = indexer.submit_document("doc1", &text).await.unwrap();
        let ids_first: Vec<String> = {
            let guard = index.read().await;
            guard
                .query(&vec![1.0; 64], first)
                .unwrap()
                .iter()
                .map(|r| r.chunk.id.clone())
                .collect()
        };

        let second = indexer.submit_document("doc1", &text).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(index.read().await.len(), second);

        let ids_second: Vec<String> = {
            let guard = index.read().await;
            guard
                .query(&vec![1.0; 64], second)
                .unwrap()
                .iter()
                .map(|r| r.chunk.id.clone())
                .collect()
        };
        assert_eq!(ids_first, ids_second);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_atomic() {
        let index = shared_index(64);
        let embedder = Arc::new(FailingEmbedder::new(64, FailureKind::Transport));
        let indexer = Indexer::new(embedder, index.clone(), 40, 10);

        let err = indexer
            .submit_document("doc1", "some content that will never be indexed")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Embedding { .. }));
        assert!(index.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_reindex_keeps_prior_chunks() {
        let index = shared_index(64);
        let good = Indexer::new(Arc::new(TrigramEmbedder::new(64)), index.clone(), 40, 10);
        let count = good.submit_document("doc1", "original content").await.unwrap();

        let bad = Indexer::new(
            Arc::new(FailingEmbedder::new(64, FailureKind::Timeout)),
            index.clone(),
            40,
            10,
        );
        assert!(bad.submit_document("doc1", "replacement content").await.is_err());

        // The prior chunk set survives the failed replacement
        assert_eq!(index.read().await.len(), count);
    }

    #[tokio::test]
    async fn test_delete_document() {
        let index = shared_index(64);
        let indexer = Indexer::new(Arc::new(TrigramEmbedder::new(64)), index.clone(), 40, 10);
        indexer.submit_document("doc1", "first document").await.unwrap();
        indexer.submit_document("doc2", "second document").await.unwrap();

        let removed = indexer.delete_document("doc1").await.unwrap();
        assert!(removed > 0);

        let guard = index.read().await;
        assert_eq!(guard.source_ids(), vec!["doc2".to_string()]);
    }

    #[tokio::test]
    async fn test_store_mirrors_index() {
        let index = shared_index(64);
        let store = Arc::new(Mutex::new(IndexStore::open_in_memory().unwrap()));
        let indexer = Indexer::new(Arc::new(TrigramEmbedder::new(64)), index.clone(), 40, 10)
            .with_store(store.clone());

        let count = indexer
            .submit_document("doc1", "persisted document content")
            .await
            .unwrap();

        let guard = store.lock().unwrap();
        let rebuilt = load_index(&guard, 64).unwrap();
        assert_eq!(rebuilt.len(), count);
    }
}
