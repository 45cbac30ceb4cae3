//! Provider capability boundary for Scribe.
//!
//! This crate abstracts the two capabilities the orchestration core needs
//! from any language-model backend:
//! - `GenerationClient::generate(prompt) -> text`
//! - `EmbeddingProvider::embed(text) -> vector`
//!
//! Concrete backends are selected at construction time through the factory
//! functions; every provider call is bounded by a configured timeout and
//! returns a typed, transience-tagged failure.
//!
//! # Providers
//! - **Ollama**: local LLM runtime, generation and embeddings (default)
//! - **Trigram**: deterministic local embeddings, no network
//! - **Mock**: scripted generation for offline development and tests

pub mod client;
pub mod embedder;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{GenerationClient, GenerationRequest, GenerationResponse, GenerationUsage};
pub use embedder::EmbeddingProvider;
pub use factory::{create_embedding_provider, create_generation_client};
pub use providers::{MockGenerationClient, OllamaClient, OllamaEmbedder, TrigramEmbedder};
