//! LLM provider factory.
//!
//! Creates a client from hub configuration, resolving the API key from
//! the configured environment variable.

use crate::client::LlmClient;
use crate::providers::{HttpLlmClient, MockLlmClient};
use quorum_core::{HubConfig, HubError, HubResult};
use std::sync::Arc;

/// Create an LLM client based on the configured provider.
///
/// # Errors
/// Returns `HubError::Config` for an unknown provider kind.
pub fn create_client(config: &HubConfig) -> HubResult<Arc<dyn LlmClient>> {
    match config.llm.provider.to_lowercase().as_str() {
        "http" => {
            let client = HttpLlmClient::new(&config.llm, config.llm_api_key())?;
            Ok(Arc::new(client))
        }
        "mock" => Ok(Arc::new(MockLlmClient::new())),
        other => Err(HubError::Config(format!(
            "Unknown LLM provider: {}",
            other
        ))),
    }
}
