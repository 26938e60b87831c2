//! LLM provider implementations.

pub mod http;
pub mod mock;

pub use http::HttpLlmClient;
pub use mock::MockLlmClient;
