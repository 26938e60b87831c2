//! Quorum LLM Library
//!
//! Provider-agnostic LLM invocation for the hub:
//! - `LlmClient` trait with completion and streaming
//! - Model-tier routing (fast vs precise)
//! - The global anti-fabrication guardrail, composed into every call
//! - Permissive JSON parsing into a tagged `ModelOutput`

pub mod client;
pub mod factory;
pub mod guardrail;
pub mod parse;
pub mod providers;
pub mod types;

pub use client::{LlmClient, LlmStream};
pub use factory::create_client;
pub use guardrail::{compose, GLOBAL_GUARDRAIL};
pub use parse::{parse_model_output, ModelOutput};
pub use types::{ChatMessage, ChatRole, GenRequest, ModelTier};
