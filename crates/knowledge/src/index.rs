//! In-memory vector index with exact nearest-neighbor search.
//!
//! Brute-force cosine distance over all entries. Exactness is a correctness
//! requirement at the scale this index serves (a few thousand chunks);
//! approximate structures are deliberately out.
//!
//! Determinism: ties in distance are broken by insertion order (earlier
//! entry wins), so repeated queries over the same index always return the
//! same sequence.

use crate::types::{IndexEntry, RetrievalResult, ScoredChunk};
use scribe_core::{AppError, AppResult};

/// Exact brute-force vector index.
pub struct VectorIndex {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty index for vectors of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: Vec::new(),
        }
    }

    /// The fixed dimensionality `d` of this index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert entries at the end of the index.
    ///
    /// Every vector must have dimensionality `d`; on any mismatch the whole
    /// insert is rejected and the index is unchanged.
    pub fn insert(&mut self, entries: Vec<IndexEntry>) -> AppResult<()> {
        for entry in &entries {
            if entry.vector.len() != self.dimensions {
                return Err(AppError::Index(format!(
                    "Entry {} has dimensionality {}, index requires {}",
                    entry.chunk.id,
                    entry.vector.len(),
                    self.dimensions
                )));
            }
        }
        self.entries.extend(entries);
        Ok(())
    }

    /// Remove all entries belonging to a source. Returns how many were removed.
    pub fn delete(&mut self, source_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.chunk.source_id != source_id);
        before - self.entries.len()
    }

    /// Remove every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Distinct source ids currently present, in first-insertion order.
    pub fn source_ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut ids = Vec::new();
        for entry in &self.entries {
            if seen.insert(entry.chunk.source_id.as_str()) {
                ids.push(entry.chunk.source_id.clone());
            }
        }
        ids
    }

    /// Return the `k` entries nearest to `vector` under cosine distance,
    /// distance-ascending.
    ///
    /// `k == 0` and empty or mismatched query vectors are `InvalidQuery`.
    /// Querying an empty index returns an empty result, not an error.
    pub fn query(&self, vector: &[f32], k: usize) -> AppResult<RetrievalResult> {
        if k == 0 {
            return Err(AppError::InvalidQuery(
                "k must be greater than zero".to_string(),
            ));
        }
        if vector.is_empty() {
            return Err(AppError::InvalidQuery("Query vector is empty".to_string()));
        }
        if vector.len() != self.dimensions {
            return Err(AppError::InvalidQuery(format!(
                "Query vector has dimensionality {}, index requires {}",
                vector.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                distance: cosine_distance(vector, &entry.vector),
            })
            .collect();

        // Stable sort keeps insertion order among equal distances
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);

        Ok(scored)
    }
}

/// Cosine distance: `1 - cos(a, b)`, in `[0, 2]`.
///
/// A zero-norm vector has no direction; distance to it is defined as 1
/// (maximally uninformative) rather than an error.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn entry(source_id: &str, n: usize, vector: Vec<f32>) -> IndexEntry {
        let text = format!("chunk {}", n);
        IndexEntry {
            chunk: Chunk::new(source_id, n * 10, n * 10 + 5, &text),
            vector,
        }
    }

    #[test]
    fn test_cosine_distance() {
        assert!((cosine_distance(&[1.0, 0.0], &[1.0, 0.0])).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert!((cosine_distance(&[0.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_query_sorted_and_bounded() {
        let mut index = VectorIndex::new(2);
        index
            .insert(vec![
                entry("a", 0, vec![1.0, 0.0]),
                entry("a", 1, vec![0.0, 1.0]),
                entry("a", 2, vec![0.7, 0.7]),
            ])
            .unwrap();

        let results = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].distance <= results[1].distance);
        assert_eq!(results[0].chunk.text, "chunk 0");
        assert_eq!(results[1].chunk.text, "chunk 2");
    }

    #[test]
    fn test_query_returns_min_k_and_size() {
        let mut index = VectorIndex::new(2);
        index
            .insert(vec![entry("a", 0, vec![1.0, 0.0]), entry("a", 1, vec![0.0, 1.0])])
            .unwrap();

        let results = index.query(&[1.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_query_empty_index_is_ok() {
        let index = VectorIndex::new(2);
        let results = index.query(&[1.0, 0.0], 3).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_query_rejects_bad_input() {
        let index = VectorIndex::new(2);
        assert!(matches!(
            index.query(&[1.0, 0.0], 0),
            Err(AppError::InvalidQuery(_))
        ));
        assert!(matches!(index.query(&[], 3), Err(AppError::InvalidQuery(_))));
        assert!(matches!(
            index.query(&[1.0, 0.0, 0.0], 3),
            Err(AppError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_tie_break_by_insertion_order() {
        let mut index = VectorIndex::new(2);
        // Two entries at identical distance from the query
        index
            .insert(vec![
                entry("first", 0, vec![0.0, 1.0]),
                entry("second", 0, vec![0.0, 1.0]),
            ])
            .unwrap();

        let results = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].chunk.source_id, "first");
        assert_eq!(results[1].chunk.source_id, "second");
    }

    #[test]
    fn test_delete_removes_exactly_one_source() {
        let mut index = VectorIndex::new(2);
        index
            .insert(vec![
                entry("keep", 0, vec![1.0, 0.0]),
                entry("drop", 0, vec![1.0, 0.0]),
                entry("drop", 1, vec![0.5, 0.5]),
                entry("keep", 1, vec![0.0, 1.0]),
            ])
            .unwrap();

        assert_eq!(index.delete("drop"), 2);
        assert_eq!(index.len(), 2);

        let results = index.query(&[1.0, 0.0], 10).unwrap();
        assert!(results.iter().all(|r| r.chunk.source_id == "keep"));
    }

    #[test]
    fn test_insert_rejects_wrong_dimensions() {
        let mut index = VectorIndex::new(3);
        let result = index.insert(vec![entry("a", 0, vec![1.0, 0.0])]);
        assert!(result.is_err());
        assert!(index.is_empty());
    }

    #[test]
    fn test_source_ids_in_insertion_order() {
        let mut index = VectorIndex::new(2);
        index
            .insert(vec![
                entry("b", 0, vec![1.0, 0.0]),
                entry("a", 0, vec![1.0, 0.0]),
                entry("b", 1, vec![1.0, 0.0]),
            ])
            .unwrap();
        assert_eq!(index.source_ids(), vec!["b".to_string(), "a".to_string()]);
    }
}
