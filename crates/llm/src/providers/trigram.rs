//! Trigram embedding provider.
//!
//! A fully local, deterministic embedding provider. Vectors are built from
//! character trigrams and word frequencies, so texts sharing vocabulary land
//! near each other under cosine distance. Not a substitute for a semantic
//! model, but deterministic and dependency-free, which makes it the default
//! for offline use and for tests.

use crate::embedder::EmbeddingProvider;
use scribe_core::AppResult;
use std::collections::{HashMap, HashSet};

/// Deterministic trigram-based embedding provider.
#[derive(Debug)]
pub struct TrigramEmbedder {
    dimensions: usize,
}

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "who", "when", "where",
];

impl TrigramEmbedder {
    /// Create a new trigram embedder with the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let lower = text.to_lowercase();

        // Tokenize on whitespace, trimming punctuation so "approved?" and
        // "approved" map to the same token.
        let words: Vec<&str> = lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.len() > 2 && !stop_words.contains(w))
            .collect();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in &words {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            // Character trigrams spread each word across several dimensions
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let mut hash = 0u64;
                for c in window {
                    let mut buf = [0u8; 4];
                    for b in c.encode_utf8(&mut buf).bytes() {
                        hash = hash.wrapping_mul(37).wrapping_add(b as u64);
                    }
                }
                let dim = (hash as usize) % self.dimensions;
                embedding[dim] += (*freq as f32).sqrt();
            }

            // Whole-word signal
            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            embedding[(word_hash as usize) % self.dimensions] += *freq as f32;
        }

        // Normalize to unit length so cosine distance is well-behaved
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramEmbedder {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_dimensions_and_normalization() {
        let provider = TrigramEmbedder::new(384);
        let embedding = provider.embed("hello world").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = TrigramEmbedder::new(384);
        let a = provider.embed("deterministic test").await.unwrap();
        let b = provider.embed("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_punctuation_insensitive_tokens() {
        let provider = TrigramEmbedder::new(384);
        let a = provider.embed("budget approved").await.unwrap();
        let b = provider.embed("approved?").await.unwrap();
        let c = provider.embed("cafeteria pizza friday").await.unwrap();

        // Shared vocabulary must beat unrelated text
        assert!(cosine(&a, &b) > cosine(&c, &b));
    }

    #[tokio::test]
    async fn test_empty_text() {
        let provider = TrigramEmbedder::new(384);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_batch_order() {
        let provider = TrigramEmbedder::new(128);
        let texts = vec!["first text".to_string(), "second text".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], provider.embed("first text").await.unwrap());
        assert_eq!(batch[1], provider.embed("second text").await.unwrap());
    }

    #[tokio::test]
    async fn test_utf8_safety() {
        let provider = TrigramEmbedder::new(384);
        let embedding = provider
            .embed("Orçamento aprovado 🎉 para o terceiro trimestre!")
            .await
            .unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
