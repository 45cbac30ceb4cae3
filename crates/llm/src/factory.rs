//! Provider factories.
//!
//! These functions resolve a provider name from configuration into a
//! concrete client, keeping the orchestration core free of any backend's
//! request/response shapes.

use crate::client::GenerationClient;
use crate::embedder::EmbeddingProvider;
use crate::providers::{MockGenerationClient, OllamaClient, OllamaEmbedder, TrigramEmbedder};
use scribe_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create a generation client for the named provider.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "mock")
/// * `endpoint` - Optional custom endpoint URL
/// * `timeout` - Mandatory per-call timeout
pub fn create_generation_client(
    provider: &str,
    endpoint: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn GenerationClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or(crate::providers::ollama::DEFAULT_ENDPOINT);
            let client = OllamaClient::with_base_url(base_url, timeout)?;
            Ok(Arc::new(client))
        }
        "mock" => Ok(Arc::new(MockGenerationClient::new())),
        _ => Err(AppError::Config(format!(
            "Unknown generation provider: {}. Supported: ollama, mock",
            provider
        ))),
    }
}

/// Create an embedding provider for the named provider.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "trigram")
/// * `endpoint` - Optional custom endpoint URL
/// * `model` - Embedding model identifier (ignored by "trigram")
/// * `dimensions` - Expected embedding dimensionality
/// * `timeout` - Mandatory per-call timeout
pub fn create_embedding_provider(
    provider: &str,
    endpoint: Option<&str>,
    model: &str,
    dimensions: usize,
    timeout: Duration,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or(crate::providers::ollama::DEFAULT_ENDPOINT);
            let embedder = OllamaEmbedder::new(base_url, model, dimensions, timeout)?;
            Ok(Arc::new(embedder))
        }
        "trigram" => Ok(Arc::new(TrigramEmbedder::new(dimensions))),
        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: {}. Supported: ollama, trigram",
            provider
        ))),
    }
}
