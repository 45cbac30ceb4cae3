//! Error types for Scribe.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, provider (embedding/generation),
//! retrieval, session, and persistence errors.

use thiserror::Error;
use uuid::Uuid;

/// Classifies why a provider call failed.
///
/// Provider calls (embedding, generation) are the only unbounded-latency
/// operations in the system; every failure is tagged so callers can tell
/// whether retrying is likely to help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The call exceeded the configured timeout
    Timeout,
    /// The provider rejected the call due to rate limiting
    RateLimited,
    /// Transport-level failure (connection refused, DNS, TLS, ...)
    Transport,
    /// The provider responded, but the payload could not be interpreted
    Malformed,
}

impl FailureKind {
    /// Whether a retry of the same call has a reasonable chance of success.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::RateLimited | Self::Transport)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::RateLimited => "rate-limited",
            Self::Transport => "transport",
            Self::Malformed => "malformed response",
        };
        f.write_str(s)
    }
}

/// Unified error type for Scribe.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic in library code; errors are represented and propagated.
/// Adapter-level failures are converted to `Embedding`/`Generation` at the
/// component boundary; raw transport errors never cross it.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding provider failure ({kind})
    #[error("Embedding failure ({kind}): {reason}")]
    Embedding { reason: String, kind: FailureKind },

    /// Generation provider failure ({kind})
    #[error("Generation failure ({kind}): {reason}")]
    Generation { reason: String, kind: FailureKind },

    /// Malformed retrieval request (k = 0, empty or wrong-sized vector)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Operation on a session that has already terminated
    #[error("Session {0} is closed")]
    SessionClosed(Uuid),

    /// Unknown session identifier
    #[error("No session with id {0}")]
    SessionNotFound(Uuid),

    /// Persisted index failed its integrity check; re-indexing is required
    #[error("Index corruption: {0}")]
    IndexCorruption(String),

    /// Vector index errors other than corruption
    #[error("Index error: {0}")]
    Index(String),

    /// The caller cancelled a pending retrieval or generation step
    #[error("Operation cancelled")]
    Cancelled,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Convenience constructor for embedding failures.
    pub fn embedding(reason: impl Into<String>, kind: FailureKind) -> Self {
        Self::Embedding {
            reason: reason.into(),
            kind,
        }
    }

    /// Convenience constructor for generation failures.
    pub fn generation(reason: impl Into<String>, kind: FailureKind) -> Self {
        Self::Generation {
            reason: reason.into(),
            kind,
        }
    }

    /// Whether retrying the failed operation is likely to help.
    ///
    /// Surfaced to users so a failed `send_message` can say whether the
    /// problem is transient (timeout, rate limit) or permanent (corruption,
    /// closed session).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Embedding { kind, .. } | Self::Generation { kind, .. } => kind.is_transient(),
            Self::Cancelled => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_transience() {
        assert!(FailureKind::Timeout.is_transient());
        assert!(FailureKind::RateLimited.is_transient());
        assert!(FailureKind::Transport.is_transient());
        assert!(!FailureKind::Malformed.is_transient());
    }

    #[test]
    fn test_error_transience() {
        let err = AppError::embedding("connection refused", FailureKind::Transport);
        assert!(err.is_transient());

        let err = AppError::generation("bad json", FailureKind::Malformed);
        assert!(!err.is_transient());

        assert!(!AppError::IndexCorruption("bad blob".into()).is_transient());
        assert!(!AppError::SessionClosed(Uuid::nil()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = AppError::embedding("timed out after 30s", FailureKind::Timeout);
        assert_eq!(
            err.to_string(),
            "Embedding failure (timeout): timed out after 30s"
        );
    }
}
