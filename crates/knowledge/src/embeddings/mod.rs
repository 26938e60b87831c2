//! Embedding gateway for the knowledge base.
//!
//! Wraps an [`EmbeddingProvider`] with a process-wide bounded memoization
//! cache so repeated queries never hit the underlying model twice. The
//! cache is keyed by a SHA-256 content hash (bounded key size) and is
//! safe under concurrent use with no external locking.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use mini_moka::sync::Cache;
use quorum_core::config::EmbeddingSettings;
use quorum_core::HubResult;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Cached embedding gateway.
///
/// Shared via `Arc<EmbeddingGateway>` across request tasks; the cache is
/// the only cross-request mutable state in the retrieval path.
pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Cache<[u8; 32], Vec<f32>>,
}

impl EmbeddingGateway {
    /// Wrap a provider with a bounded cache.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self { provider, cache }
    }

    /// Build the gateway from embedding settings.
    pub fn from_settings(settings: &EmbeddingSettings) -> HubResult<Self> {
        let provider = create_provider(settings)?;
        Ok(Self::new(
            provider,
            settings.cache_capacity,
            Duration::from_secs(settings.cache_ttl_secs),
        ))
    }

    /// Embedding dimensionality of the underlying provider.
    pub fn dimension(&self) -> usize {
        self.provider.dimensions()
    }

    fn cache_key(text: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.finalize().into()
    }

    /// Embed a single text, consulting the cache first.
    ///
    /// Provider failure is fatal to the caller: retrieval without a real
    /// query vector would be meaningless.
    pub async fn embed(&self, text: &str) -> HubResult<Vec<f32>> {
        let key = Self::cache_key(text);

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!("Embedding cache hit");
            return Ok(hit);
        }

        let vector = self.provider.embed(text).await?;
        self.cache.insert(key, vector.clone());
        Ok(vector)
    }

    /// Embed a batch of texts, order-preserving.
    ///
    /// Cached entries are reused; all misses go to the provider in one
    /// batch and are reinserted under their content hash.
    pub async fn embed_batch(&self, texts: &[String]) -> HubResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut miss_indices = Vec::new();
        let mut miss_texts = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let key = Self::cache_key(text);
            match self.cache.get(&key) {
                Some(hit) => results.push(Some(hit)),
                None => {
                    results.push(None);
                    miss_indices.push(i);
                    miss_texts.push(text.clone());
                }
            }
        }

        if !miss_texts.is_empty() {
            tracing::debug!(
                total = texts.len(),
                misses = miss_texts.len(),
                "Embedding batch"
            );

            let fresh = self.provider.embed_batch(&miss_texts).await?;
            for ((index, text), vector) in miss_indices.iter().zip(&miss_texts).zip(fresh) {
                self.cache.insert(Self::cache_key(text), vector.clone());
                results[*index] = Some(vector);
            }
        }

        // Every slot is filled: hits on the first pass, misses just above
        Ok(results.into_iter().flatten().collect())
    }
}

/// Cosine similarity between two vectors, in [-1, 1].
///
/// Mismatched lengths and zero vectors yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
