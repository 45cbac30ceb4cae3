//! Concrete provider implementations.

pub mod mock;
pub mod ollama;
pub mod trigram;

pub use mock::{FailingEmbedder, MockGenerationClient};
pub use ollama::{OllamaClient, OllamaEmbedder};
pub use trigram::TrigramEmbedder;
