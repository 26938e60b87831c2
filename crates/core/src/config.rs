//! Configuration management for the Quorum hub.
//!
//! Configuration is merged from three sources, lowest precedence first:
//! - Built-in serde defaults
//! - An optional YAML config file
//! - `QUORUM_*` environment variables

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HubError, HubResult};

/// Top-level hub configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubConfig {
    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalSettings,

    /// Document ingestion settings
    #[serde(default)]
    pub ingest: IngestSettings,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemorySettings,

    /// Rate limiter settings
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

/// LLM provider configuration.
///
/// The hub routes each task to one of two model tiers; both resolve to
/// concrete model identifiers here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider kind: "http" or "mock"
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Base URL of the chat-completions endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Environment variable holding the API key, if the endpoint needs one
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Model used for the fast/cheap tier (intent, summaries, drafting)
    #[serde(default = "default_fast_model")]
    pub fast_model: String,

    /// Model used for the precise/expensive tier (audit, synthesis)
    #[serde(default = "default_precise_model")]
    pub precise_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider kind: "http" or "trigram"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Base URL of the embedding endpoint (http provider only)
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    /// Embedding model identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding vector dimension
    #[serde(default = "default_embedding_dim")]
    pub dimension: usize,

    /// Maximum entries in the process-wide embedding cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Time-to-live for cached embeddings, in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Default number of chunks returned per query
    #[serde(default = "default_retrieval_limit")]
    pub limit: usize,
}

/// Ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks, in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySettings {
    /// Summarize the conversation every N turns
    #[serde(default = "default_summary_interval")]
    pub summary_interval: usize,
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Strategy: "local" (in-process token bucket) or "shared"
    /// (external counter). Unknown values fall back to "local".
    #[serde(default = "default_rate_strategy")]
    pub strategy: String,

    /// Token bucket capacity (local strategy)
    #[serde(default = "default_bucket_capacity")]
    pub bucket_capacity: f64,

    /// Token refill rate per second (local strategy)
    #[serde(default = "default_refill_per_sec")]
    pub refill_per_sec: f64,

    /// Window length in seconds (shared strategy)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Maximum requests per window (shared strategy)
    #[serde(default = "default_max_per_window")]
    pub max_per_window: u64,
}

fn default_llm_provider() -> String {
    "http".to_string()
}

fn default_llm_endpoint() -> String {
    "http://localhost:8000/v1".to_string()
}

fn default_fast_model() -> String {
    "quorum-fast".to_string()
}

fn default_precise_model() -> String {
    "quorum-precise".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_embedding_provider() -> String {
    "http".to_string()
}

fn default_embedding_endpoint() -> String {
    "http://localhost:8001".to_string()
}

fn default_embedding_model() -> String {
    "bge-m3".to_string()
}

fn default_embedding_dim() -> usize {
    768
}

fn default_cache_capacity() -> u64 {
    2048
}

fn default_cache_ttl() -> u64 {
    1800
}

fn default_retrieval_limit() -> usize {
    8
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_summary_interval() -> usize {
    3
}

fn default_rate_strategy() -> String {
    "local".to_string()
}

fn default_bucket_capacity() -> f64 {
    10.0
}

fn default_refill_per_sec() -> f64 {
    0.5
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_per_window() -> u64 {
    30
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            endpoint: default_llm_endpoint(),
            api_key_env: None,
            fast_model: default_fast_model(),
            precise_model: default_precise_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            dimension: default_embedding_dim(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            limit: default_retrieval_limit(),
        }
    }
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            summary_interval: default_summary_interval(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            strategy: default_rate_strategy(),
            bucket_capacity: default_bucket_capacity(),
            refill_per_sec: default_refill_per_sec(),
            window_secs: default_window_secs(),
            max_per_window: default_max_per_window(),
        }
    }
}

impl HubConfig {
    /// Load configuration from an optional YAML file plus environment
    /// overrides.
    ///
    /// Environment variables:
    /// - `QUORUM_LLM_PROVIDER`, `QUORUM_LLM_ENDPOINT`
    /// - `QUORUM_FAST_MODEL`, `QUORUM_PRECISE_MODEL`
    /// - `QUORUM_EMBED_PROVIDER`, `QUORUM_EMBED_ENDPOINT`
    /// - `QUORUM_RATE_STRATEGY`
    pub fn load(path: Option<&Path>) -> HubResult<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p).map_err(|e| {
                    HubError::Config(format!("Failed to read config file {:?}: {}", p, e))
                })?;
                serde_yaml::from_str(&raw)
                    .map_err(|e| HubError::Config(format!("Invalid config file {:?}: {}", p, e)))?
            }
            None => Self::default(),
        };

        if let Ok(provider) = std::env::var("QUORUM_LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(endpoint) = std::env::var("QUORUM_LLM_ENDPOINT") {
            config.llm.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("QUORUM_FAST_MODEL") {
            config.llm.fast_model = model;
        }
        if let Ok(model) = std::env::var("QUORUM_PRECISE_MODEL") {
            config.llm.precise_model = model;
        }
        if let Ok(provider) = std::env::var("QUORUM_EMBED_PROVIDER") {
            config.embedding.provider = provider;
        }
        if let Ok(endpoint) = std::env::var("QUORUM_EMBED_ENDPOINT") {
            config.embedding.endpoint = endpoint;
        }
        if let Ok(strategy) = std::env::var("QUORUM_RATE_STRATEGY") {
            config.rate_limit.strategy = strategy;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    fn validate(&self) -> HubResult<()> {
        if self.embedding.dimension == 0 {
            return Err(HubError::Config(
                "Embedding dimension must be non-zero".to_string(),
            ));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(HubError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        if self.memory.summary_interval == 0 {
            return Err(HubError::Config(
                "Summary interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the API key for the LLM endpoint, if configured.
    pub fn llm_api_key(&self) -> Option<String> {
        self.llm
            .api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();
        assert_eq!(config.embedding.dimension, 768);
        assert_eq!(config.embedding.cache_capacity, 2048);
        assert_eq!(config.retrieval.limit, 8);
        assert_eq!(config.memory.summary_interval, 3);
        assert_eq!(config.rate_limit.strategy, "local");
    }

    #[test]
    fn test_load_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "llm:\n  fast_model: flash-2\nretrieval:\n  limit: 4\n"
        )
        .unwrap();

        let config = HubConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.llm.fast_model, "flash-2");
        assert_eq!(config.retrieval.limit, 4);
        // Untouched sections keep their defaults
        assert_eq!(config.embedding.dimension, 768);
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        let mut config = HubConfig::default();
        config.ingest.chunk_size = 100;
        config.ingest.chunk_overlap = 100;
        assert!(config.validate().is_err());
    }
}
