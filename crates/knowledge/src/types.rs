//! Retrieval subsystem type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A contiguous span of a source document.
///
/// Identity is `(source_id, start_offset, end_offset)`; the id is a stable
/// digest over identity and text, so re-chunking identical content yields
/// identical ids. Offsets are byte offsets into the original document and
/// always satisfy `start_offset < end_offset <= document length`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable chunk identifier (SHA-256 over identity + text)
    pub id: String,

    /// Source document identifier
    pub source_id: String,

    /// Byte offset of the chunk start within the document
    pub start_offset: usize,

    /// Byte offset one past the chunk end within the document
    pub end_offset: usize,

    /// The chunk text (exactly `document[start_offset..end_offset]`)
    pub text: String,
}

impl Chunk {
    /// Create a chunk, deriving its stable id.
    pub fn new(source_id: &str, start_offset: usize, end_offset: usize, text: &str) -> Self {
        Self {
            id: Self::derive_id(source_id, start_offset, end_offset, text),
            source_id: source_id.to_string(),
            start_offset,
            end_offset,
            text: text.to_string(),
        }
    }

    /// Derive the stable chunk id from its identity and content.
    pub fn derive_id(source_id: &str, start_offset: usize, end_offset: usize, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source_id.as_bytes());
        hasher.update(start_offset.to_le_bytes());
        hasher.update(end_offset.to_le_bytes());
        hasher.update(text.as_bytes());
        let digest = hasher.finalize();
        // 16 bytes of hex is plenty for uniqueness here
        digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Human-readable source attribution for prompt context.
    pub fn attribution(&self) -> String {
        format!(
            "[source: {} {}..{}]",
            self.source_id, self.start_offset, self.end_offset
        )
    }
}

/// An entry stored in the vector index.
///
/// Entries are owned by the index and never mutated in place; replacement
/// is delete-then-insert.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// The indexed chunk
    pub chunk: Chunk,

    /// The chunk's embedding vector
    pub vector: Vec<f32>,
}

/// A retrieved chunk with its distance to the query vector.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,

    /// Cosine distance (0 = identical direction, 2 = opposite)
    pub distance: f32,
}

/// Ordered retrieval output: up to `k` chunks, distance-ascending.
///
/// An empty result means "searched, found nothing"; retrieval failures
/// are reported as errors, never as an empty result.
pub type RetrievalResult = Vec<ScoredChunk>;

/// Bookkeeping record for an indexed source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Source document identifier
    pub source_id: String,

    /// When this source was last indexed
    pub indexed_at: DateTime<Utc>,

    /// Number of chunks produced
    pub chunk_count: usize,

    /// Document size in bytes
    pub byte_count: usize,
}
