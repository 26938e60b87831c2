//! LLM client abstraction.
//!
//! This module defines the core trait for interacting with LLM providers.

use futures::Stream;
use quorum_core::HubResult;
use std::pin::Pin;

use crate::types::GenRequest;

/// Stream of incremental text fragments.
pub type LlmStream = Pin<Box<dyn Stream<Item = HubResult<String>> + Send>>;

/// Trait for LLM providers.
///
/// Implementations route the request's model tier to a concrete model and
/// must forward `request.system` verbatim — guardrail composition happens
/// before a `GenRequest` is built, and no provider may alter it.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "http", "mock").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming generation, returning the full text.
    async fn generate(&self, request: &GenRequest) -> HubResult<String>;

    /// Perform a streaming generation.
    ///
    /// Yields incremental text fragments as they arrive from the model.
    async fn stream(&self, request: &GenRequest) -> HubResult<LlmStream>;
}
