//! HTTP embedding provider.
//!
//! Talks to a hosted embedding server (BGE-style) exposing a JSON
//! `/embed` endpoint that accepts a batch of texts and returns one
//! vector per text, in order.

use crate::embeddings::provider::EmbeddingProvider;
use async_trait::async_trait;
use quorum_core::config::EmbeddingSettings;
use quorum_core::{HubError, HubResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Request payload for the embedding endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
}

/// Response from the embedding endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding provider backed by an HTTP endpoint.
#[derive(Debug)]
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbeddingProvider {
    /// Create a provider from embedding settings.
    pub fn new(settings: &EmbeddingSettings) -> HubResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| HubError::Model(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            dimensions: settings.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn provider_name(&self) -> &str {
        "http"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> HubResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embed", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            texts,
        };

        tracing::debug!(count = texts.len(), "Requesting embeddings");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HubError::Model(format!("Failed to reach embedding server: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HubError::Model(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| HubError::Model(format!("Failed to parse embedding response: {}", e)))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(HubError::Model(format!(
                "Embedding count mismatch: sent {} texts, got {} vectors",
                texts.len(),
                parsed.embeddings.len()
            )));
        }

        if let Some(bad) = parsed
            .embeddings
            .iter()
            .find(|v| v.len() != self.dimensions)
        {
            return Err(HubError::Model(format!(
                "Unexpected embedding dimension: expected {}, got {}",
                self.dimensions,
                bad.len()
            )));
        }

        Ok(parsed.embeddings)
    }
}
