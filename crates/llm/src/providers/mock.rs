//! Mock generation provider for offline development and tests.
//!
//! Produces scripted or echoed drafts without any network access, and can
//! be configured to fail or stall, which the orchestrator tests use to
//! exercise degraded and cancelled turns.

use crate::client::{GenerationClient, GenerationRequest, GenerationResponse, GenerationUsage};
use scribe_core::{AppError, AppResult, FailureKind};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Mock generation client.
///
/// By default each call echoes a short canned draft derived from the prompt.
/// Scripted responses, injected failures, and artificial latency can be
/// layered on top.
pub struct MockGenerationClient {
    scripted: Mutex<VecDeque<String>>,
    fail_with: Option<FailureKind>,
    delay: Option<Duration>,
}

impl MockGenerationClient {
    /// Create a mock client that echoes canned drafts.
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fail_with: None,
            delay: None,
        }
    }

    /// Queue a scripted response; scripted responses are returned in order
    /// before falling back to echo behavior.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        {
            let mut scripted = self.scripted.lock().unwrap_or_else(|e| e.into_inner());
            scripted.push_back(response.into());
        }
        self
    }

    /// Make every call fail with the given kind.
    pub fn failing(kind: FailureKind) -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fail_with: Some(kind),
            delay: None,
        }
    }

    /// Add artificial latency before each response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl GenerationClient for MockGenerationClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(kind) = self.fail_with {
            return Err(AppError::generation("mock provider failure", kind));
        }

        let content = {
            let mut scripted = self.scripted.lock().unwrap_or_else(|e| e.into_inner());
            scripted.pop_front()
        };

        let content = content.unwrap_or_else(|| {
            let head: String = request.prompt.chars().take(80).collect();
            format!("[draft] {}", head)
        });

        Ok(GenerationResponse {
            content,
            model: request.model.clone(),
            usage: GenerationUsage::default(),
        })
    }
}

/// Embedding provider that always fails.
///
/// Used to exercise atomic indexing and degraded-retrieval paths.
#[derive(Debug)]
pub struct FailingEmbedder {
    dimensions: usize,
    kind: FailureKind,
}

impl FailingEmbedder {
    pub fn new(dimensions: usize, kind: FailureKind) -> Self {
        Self { dimensions, kind }
    }
}

#[async_trait::async_trait]
impl crate::embedder::EmbeddingProvider for FailingEmbedder {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "failing-v0"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::embedding("mock embedding failure", self.kind))
    }
}
