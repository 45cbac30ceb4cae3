//! Ollama provider implementation.
//!
//! This module provides generation and embedding via Ollama, a local LLM
//! runtime. Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md
//!
//! All calls are bounded by the timeout the client is constructed with;
//! exceeding it is reported as a transient `FailureKind::Timeout`.

use crate::client::{GenerationClient, GenerationRequest, GenerationResponse, GenerationUsage};
use crate::embedder::EmbeddingProvider;
use scribe_core::{AppError, AppResult, FailureKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Ollama /api/generate request format.
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    stream: bool,
}

/// Ollama /api/generate response format.
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    model: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama /api/embeddings request format.
#[derive(Debug, Serialize)]
struct OllamaEmbedRequest {
    model: String,
    prompt: String,
}

/// Ollama /api/embeddings response format.
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

/// Map a reqwest error to a tagged failure kind.
fn classify_reqwest_error(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_decode() {
        FailureKind::Malformed
    } else {
        FailureKind::Transport
    }
}

/// Map an HTTP status to a tagged failure kind.
fn classify_status(status: reqwest::StatusCode) -> FailureKind {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        FailureKind::RateLimited
    } else {
        FailureKind::Transport
    }
}

fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Ollama generation client.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client against the default local endpoint.
    pub fn new(timeout: Duration) -> AppResult<Self> {
        Self::with_base_url(DEFAULT_ENDPOINT, timeout)
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            client: build_http_client(timeout)?,
        })
    }

    fn to_ollama_request(&self, request: &GenerationRequest) -> OllamaGenerateRequest {
        OllamaGenerateRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            temperature: request.temperature,
            num_predict: request.max_tokens,
            stream: false,
        }
    }
}

#[async_trait::async_trait]
impl GenerationClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        tracing::info!("Sending generation request to Ollama");
        tracing::debug!("Request model: {}", request.model);

        let ollama_request = self.to_ollama_request(request);
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| {
                AppError::generation(
                    format!("Failed to reach Ollama: {}", e),
                    classify_reqwest_error(&e),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::generation(
                format!("Ollama API error ({}): {}", status, error_text),
                classify_status(status),
            ));
        }

        let ollama_response: OllamaGenerateResponse = response.json().await.map_err(|e| {
            AppError::generation(
                format!("Failed to parse Ollama response: {}", e),
                FailureKind::Malformed,
            )
        })?;

        tracing::info!("Received generation from Ollama");

        Ok(GenerationResponse {
            content: ollama_response.response,
            model: ollama_response.model,
            usage: GenerationUsage::new(
                ollama_response.prompt_eval_count.unwrap_or(0),
                ollama_response.eval_count.unwrap_or(0),
            ),
        })
    }
}

/// Ollama embedding provider.
#[derive(Debug)]
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    dimensions: usize,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder.
    ///
    /// `dimensions` must match what the embedding model actually produces;
    /// mismatched responses are reported as malformed.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
            client: build_http_client(timeout)?,
        })
    }

    async fn embed_one(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = OllamaEmbedRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::embedding(
                    format!("Failed to reach Ollama: {}", e),
                    classify_reqwest_error(&e),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::embedding(
                format!("Ollama API error ({}): {}", status, error_text),
                classify_status(status),
            ));
        }

        let embed_response: OllamaEmbedResponse = response.json().await.map_err(|e| {
            AppError::embedding(
                format!("Failed to parse embedding response: {}", e),
                FailureKind::Malformed,
            )
        })?;

        if embed_response.embedding.len() != self.dimensions {
            return Err(AppError::embedding(
                format!(
                    "Expected {}-dimensional embedding, got {}",
                    self.dimensions,
                    embed_response.embedding.len()
                ),
                FailureKind::Malformed,
            ));
        }

        Ok(embed_response.embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // The embeddings endpoint takes one prompt per call; any failure
        // aborts the whole batch so callers never see partial results.
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_one(text).await?);
        }
        Ok(embeddings)
    }
}
