//! Configuration management for Scribe.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Built-in defaults
//! - Config file (.scribe/config.yaml)
//! - Environment variables (SCRIBE_*)
//! - Command-line flags
//!
//! Provider timeouts are mandatory configuration: provider calls are the
//! only unbounded-latency operations in the system, so a missing or zero
//! timeout is a validation error.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .scribe/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider (e.g., "ollama", "mock")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Embedding provider (e.g., "ollama", "trigram")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Provider endpoint URL (for HTTP-backed providers)
    pub endpoint: Option<String>,

    /// Provider call timeout in seconds (mandatory, must be > 0)
    pub timeout_secs: u64,

    /// Indexing and retrieval parameters
    pub indexing: IndexingConfig,

    /// Conversation parameters
    pub conversation: ConversationConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Chunking and retrieval parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Target chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in bytes (0 <= overlap < size)
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Embedding vector dimensionality
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Number of chunks to retrieve per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    160
}

fn default_embedding_dim() -> usize {
    384
}

fn default_top_k() -> usize {
    4
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embedding_dim: default_embedding_dim(),
            top_k: default_top_k(),
        }
    }
}

/// Conversation parameters for the agent orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Number of prior turns carried into each composed prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Retrieval-need policy: "keyword" or "always"
    #[serde(default = "default_retrieval_policy")]
    pub retrieval_policy: String,

    /// Maximum tokens per generated draft
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_history_window() -> usize {
    6
}

fn default_retrieval_policy() -> String {
    "keyword".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            retrieval_policy: default_retrieval_policy(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Full configuration file structure (.scribe/config.yaml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    provider: Option<String>,
    model: Option<String>,
    #[serde(rename = "embeddingProvider")]
    embedding_provider: Option<String>,
    #[serde(rename = "embeddingModel")]
    embedding_model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
    indexing: Option<IndexingConfig>,
    conversation: Option<ConversationConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            endpoint: None,
            timeout_secs: 30,
            indexing: IndexingConfig::default(),
            conversation: ConversationConfig::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `SCRIBE_WORKSPACE`: Override workspace path
    /// - `SCRIBE_CONFIG`: Path to config file
    /// - `SCRIBE_PROVIDER`: Generation provider
    /// - `SCRIBE_MODEL`: Generation model identifier
    /// - `SCRIBE_EMBEDDING_PROVIDER`: Embedding provider
    /// - `SCRIBE_ENDPOINT`: Provider endpoint URL
    /// - `SCRIBE_TIMEOUT_SECS`: Provider call timeout
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("SCRIBE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("SCRIBE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".scribe/config.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("SCRIBE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("SCRIBE_MODEL") {
            config.model = model;
        }

        if let Ok(provider) = std::env::var("SCRIBE_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }

        if let Ok(endpoint) = std::env::var("SCRIBE_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        if let Ok(timeout) = std::env::var("SCRIBE_TIMEOUT_SECS") {
            config.timeout_secs = timeout
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid SCRIBE_TIMEOUT_SECS: {}", timeout)))?;
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(provider) = config_file.provider {
            result.provider = provider;
        }
        if let Some(model) = config_file.model {
            result.model = model;
        }
        if let Some(provider) = config_file.embedding_provider {
            result.embedding_provider = provider;
        }
        if let Some(model) = config_file.embedding_model {
            result.embedding_model = model;
        }
        if let Some(endpoint) = config_file.endpoint {
            result.endpoint = Some(endpoint);
        }
        if let Some(timeout) = config_file.timeout_secs {
            result.timeout_secs = timeout;
        }
        if let Some(indexing) = config_file.indexing {
            result.indexing = indexing;
        }
        if let Some(conversation) = config_file.conversation {
            result.conversation = conversation;
        }
        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Provider call timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the path to the .scribe directory.
    pub fn scribe_dir(&self) -> PathBuf {
        self.workspace.join(".scribe")
    }

    /// Get the path to the persisted vector index database.
    pub fn index_db_path(&self) -> PathBuf {
        self.scribe_dir().join("index.db")
    }

    /// Get the directory accepted drafts are saved to.
    pub fn drafts_dir(&self) -> PathBuf {
        self.workspace.join("drafts")
    }

    /// Ensure the .scribe directory exists.
    pub fn ensure_scribe_dir(&self) -> AppResult<()> {
        let dir = self.scribe_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .scribe directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AppResult<()> {
        let known_generation = ["ollama", "mock"];
        if !known_generation.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown generation provider: {}. Supported: {}",
                self.provider,
                known_generation.join(", ")
            )));
        }

        let known_embedding = ["ollama", "trigram"];
        if !known_embedding.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                known_embedding.join(", ")
            )));
        }

        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "Provider timeout must be greater than zero".to_string(),
            ));
        }

        if self.indexing.chunk_size == 0 {
            return Err(AppError::Config("Chunk size must be non-zero".to_string()));
        }

        if self.indexing.chunk_overlap >= self.indexing.chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.indexing.chunk_overlap, self.indexing.chunk_size
            )));
        }

        if self.indexing.top_k == 0 {
            return Err(AppError::Config("top_k must be greater than zero".to_string()));
        }

        if self.indexing.embedding_dim == 0 {
            return Err(AppError::Config(
                "Embedding dimension must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.embedding_provider, "ollama");
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scribe_dir() {
        let config = AppConfig::default();
        assert!(config.scribe_dir().ends_with(".scribe"));
        assert!(config.index_db_path().ends_with(".scribe/index.db"));
        assert!(config.drafts_dir().ends_with("drafts"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("mock".to_string()),
            Some("draft-1".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "mock");
        assert_eq!(overridden.model, "draft-1");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config = AppConfig {
            provider: "unknown".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = AppConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_overlap_bounds() {
        let mut config = AppConfig::default();
        config.indexing.chunk_size = 100;
        config.indexing.chunk_overlap = 100;
        assert!(config.validate().is_err());

        config.indexing.chunk_overlap = 99;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_yaml() {
        let dir = std::env::temp_dir().join(format!("scribe-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        std::fs::write(
            &path,
            "provider: mock\ntimeoutSecs: 5\nindexing:\n  chunk_size: 400\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        let merged = config.merge_yaml(&path).unwrap();
        assert_eq!(merged.provider, "mock");
        assert_eq!(merged.timeout_secs, 5);
        assert_eq!(merged.indexing.chunk_size, 400);

        std::fs::remove_dir_all(&dir).ok();
    }
}
