//! Embedding provider trait and factory.

use quorum_core::config::EmbeddingSettings;
use quorum_core::{HubError, HubResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// `embed_batch` is order-preserving and deterministic: identical text
/// must yield an identical vector.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "http", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> HubResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> HubResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| HubError::Model("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(settings: &EmbeddingSettings) -> HubResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "http" => {
            let provider = super::providers::http::HttpEmbeddingProvider::new(settings)?;
            Ok(Arc::new(provider))
        }

        "trigram" => {
            let provider = super::providers::trigram::TrigramProvider::new(settings.dimension);
            Ok(Arc::new(provider))
        }

        other => Err(HubError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: http, trigram",
            other
        ))),
    }
}
