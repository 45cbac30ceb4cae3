//! Text chunking with configurable size and overlap.
//!
//! Chunking is character-based with UTF-8 boundary snapping and is fully
//! deterministic: the same input and configuration always produce the same
//! chunk set, which is what makes re-indexing idempotent.

use crate::types::Chunk;
use scribe_core::{AppError, AppResult};

/// Split text into overlapping chunks with byte-offset identity.
///
/// Each chunk's text is exactly `text[start_offset..end_offset]`; offsets
/// are snapped to UTF-8 character boundaries. Requires
/// `0 <= overlap < chunk_size`.
pub fn chunk_text(
    source_id: &str,
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> AppResult<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(AppError::Config("Chunk size must be non-zero".to_string()));
    }
    if overlap >= chunk_size {
        return Err(AppError::Config(format!(
            "Chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, chunk_size
        )));
    }

    if text.is_empty() {
        return Ok(vec![]);
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let step = chunk_size - overlap;

    loop {
        // Snap the end down to a character boundary
        let mut end = (start + chunk_size).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        // A single multi-byte character wider than chunk_size: extend instead
        if end == start {
            end = start + chunk_size;
            while end < text.len() && !text.is_char_boundary(end) {
                end += 1;
            }
            end = end.min(text.len());
        }

        chunks.push(Chunk::new(source_id, start, end, &text[start..end]));

        if end == text.len() {
            break;
        }

        // Snap the next start up to a character boundary
        let mut next_start = start + step;
        while next_start < text.len() && !text.is_char_boundary(next_start) {
            next_start += 1;
        }
        if next_start >= text.len() {
            break;
        }
        start = next_start;
    }

    tracing::debug!(
        "Chunked '{}' into {} chunks (size: {}, overlap: {})",
        source_id,
        chunks.len(),
        chunk_size,
        overlap
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_basic() {
        let text = "a".repeat(1000);
        let chunks = chunk_text("test-source", &text, 200, 50).unwrap();

        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[0].end_offset, 200);
        assert_eq!(chunks[1].start_offset, 150);
    }

    #[test]
    fn test_chunk_no_overlap_covers_text() {
        let text = "a".repeat(300);
        let chunks = chunk_text("test-source", &text, 100, 0).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.last().unwrap().end_offset, 300);
    }

    #[test]
    fn test_chunk_offsets_invariant() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);
        let chunks = chunk_text("test-source", &text, 120, 30).unwrap();

        for chunk in &chunks {
            assert!(chunk.start_offset < chunk.end_offset);
            assert!(chunk.end_offset <= text.len());
            assert_eq!(chunk.text, &text[chunk.start_offset..chunk.end_offset]);
        }
    }

    #[test]
    fn test_chunk_empty() {
        let chunks = chunk_text("test-source", "", 100, 10).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunk_deterministic() {
        let text = "abcdefghijklmnopqrstuvwxyz".repeat(10);
        let a = chunk_text("s", &text, 50, 10).unwrap();
        let b = chunk_text("s", &text, 50, 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_chunk_shorter_than_size() {
        let chunks = chunk_text("s", "short", 100, 10).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
        assert_eq!(chunks[0].end_offset, 5);
    }

    #[test]
    fn test_chunk_utf8_boundaries() {
        let text = "áéíóú".repeat(50); // 2 bytes per char
        let chunks = chunk_text("s", &text, 25, 5).unwrap();

        for chunk in &chunks {
            // Slicing would panic on a non-boundary; also verify explicitly
            assert!(text.is_char_boundary(chunk.start_offset));
            assert!(text.is_char_boundary(chunk.end_offset));
        }
        assert_eq!(chunks.last().unwrap().end_offset, text.len());
    }

    #[test]
    fn test_chunk_rejects_bad_config() {
        assert!(chunk_text("s", "text", 0, 0).is_err());
        assert!(chunk_text("s", "text", 10, 10).is_err());
        assert!(chunk_text("s", "text", 10, 20).is_err());
    }
}
