//! Embedding provider trait.
//!
//! The retrieval subsystem depends only on this trait: `embed(text)` returns
//! a fixed-length vector whose dimensionality is constant for the lifetime
//! of the provider (and therefore of any index built with it).

use scribe_core::{AppError, AppResult};

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensionality
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    ///
    /// Returns one vector per input text, in input order. Either every
    /// text is embedded or the whole call fails; callers rely on this
    /// for atomic document indexing.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results.pop().ok_or_else(|| {
            AppError::embedding(
                "provider returned no embedding",
                scribe_core::FailureKind::Malformed,
            )
        })
    }
}
