//! Query-time retrieval: embed the query, search the index, build context.

use crate::indexer::SharedIndex;
use crate::types::RetrievalResult;
use scribe_core::AppResult;
use scribe_llm::EmbeddingProvider;
use std::sync::Arc;

/// Retrieves the chunks most relevant to a query string.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: SharedIndex,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: SharedIndex) -> Self {
        Self { embedder, index }
    }

    /// Retrieve up to `k` chunks for the query text.
    ///
    /// An embedding failure propagates as `EmbeddingFailure`; it is never
    /// masked as an empty result. An empty result always means the index
    /// was actually searched and nothing was found.
    pub async fn retrieve(&self, query_text: &str, k: usize) -> AppResult<RetrievalResult> {
        tracing::debug!("Retrieving top-{} chunks for query", k);

        let query_vector = self.embedder.embed(query_text).await?;

        let index = self.index.read().await;
        let results = index.query(&query_vector, k)?;

        tracing::debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }
}

/// Assemble retrieved chunks into a context block with source attribution.
///
/// Formatting is deterministic: chunks appear in retrieval order, each
/// prefixed by its attribution line.
pub fn context_block(results: &RetrievalResult) -> String {
    results
        .iter()
        .map(|scored| format!("{}\n{}", scored.chunk.attribution(), scored.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}
