//! Retrieval-need classification.
//!
//! Deciding whether a message needs external context is a pluggable policy
//! behind a trait, not a hard-coded heuristic. The default keyword policy
//! looks for question cues and references to the user's documents; the
//! always-retrieve policy is for corpora small enough that retrieval is
//! effectively free.

use scribe_core::{AppError, AppResult};
use std::sync::Arc;

/// Policy deciding whether a user message needs retrieved context.
pub trait RetrievalPolicy: Send + Sync {
    /// Policy name (e.g., "keyword", "always").
    fn name(&self) -> &str;

    /// Whether the message should trigger retrieval.
    fn needs_retrieval(&self, message: &str) -> bool;
}

/// Keyword-cue policy: retrieve when the message asks a question or refers
/// to facts that would live in the user's reference documents.
pub struct KeywordPolicy;

const RETRIEVAL_CUES: &[&str] = &[
    "what", "when", "who", "where", "which", "why", "how",
    "according", "mention", "notes", "document", "report",
    "find", "look up", "details", "deadline", "date", "figure",
    "include the", "based on",
];

impl RetrievalPolicy for KeywordPolicy {
    fn name(&self) -> &str {
        "keyword"
    }

    fn needs_retrieval(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        if lower.contains('?') {
            return true;
        }
        RETRIEVAL_CUES.iter().any(|cue| lower.contains(cue))
    }
}

/// Policy that always retrieves.
pub struct AlwaysRetrieve;

impl RetrievalPolicy for AlwaysRetrieve {
    fn name(&self) -> &str {
        "always"
    }

    fn needs_retrieval(&self, _message: &str) -> bool {
        true
    }
}

/// Create a retrieval policy by name.
pub fn create_policy(name: &str) -> AppResult<Arc<dyn RetrievalPolicy>> {
    match name.to_lowercase().as_str() {
        "keyword" => Ok(Arc::new(KeywordPolicy)),
        "always" => Ok(Arc::new(AlwaysRetrieve)),
        _ => Err(AppError::Config(format!(
            "Unknown retrieval policy: {}. Supported: keyword, always",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_policy_questions() {
        let policy = KeywordPolicy;
        assert!(policy.needs_retrieval("What was approved?"));
        assert!(policy.needs_retrieval("when is the deadline"));
        assert!(policy.needs_retrieval("Include the figures from the report"));
    }

    #[test]
    fn test_keyword_policy_plain_drafting() {
        let policy = KeywordPolicy;
        assert!(!policy.needs_retrieval("Draft a friendly greeting email."));
        assert!(!policy.needs_retrieval("Make it shorter."));
    }

    #[test]
    fn test_always_policy() {
        let policy = AlwaysRetrieve;
        assert!(policy.needs_retrieval("anything at all"));
    }

    #[test]
    fn test_create_policy() {
        assert_eq!(create_policy("keyword").unwrap().name(), "keyword");
        assert_eq!(create_policy("always").unwrap().name(), "always");
        assert!(create_policy("oracle").is_err());
    }
}
