//! Document indexing and similarity retrieval for Scribe.
//!
//! This crate implements the retrieval subsystem behind the drafting agent:
//! - Deterministic overlapping chunking with byte-offset identity
//! - An exact, brute-force in-memory vector index (cosine distance)
//! - Atomic document ingestion (embed everything, then delete-then-insert)
//! - Query-time retrieval with source-attributed context assembly
//! - Optional SQLite persistence with integrity-checked reload

pub mod chunker;
pub mod index;
pub mod indexer;
pub mod retriever;
pub mod store;
pub mod types;

// Re-export commonly used items
pub use chunker::chunk_text;
pub use index::{cosine_distance, VectorIndex};
pub use indexer::{load_index, Indexer, SharedIndex};
pub use retriever::{context_block, Retriever};
pub use store::IndexStore;
pub use types::{Chunk, IndexEntry, RetrievalResult, ScoredChunk, SourceRecord};
