//! Error types for the Quorum hub.
//!
//! This module defines a unified error enum covering all error categories
//! in the workspace: authorization, configuration, I/O, model invocation,
//! retrieval, and rate limiting.

use thiserror::Error;

/// Unified error type for the Quorum hub.
///
/// All fallible functions in the workspace return `Result<T, HubError>`.
/// We never panic — errors must be represented and propagated.
///
/// Two failure categories deliberately do NOT appear here:
/// - Malformed model output is recovered locally as an unparsed payload
///   (`quorum-llm::parse::ModelOutput::Unparsed`), never raised.
/// - An unrecognized knowledge-domain selector yields empty retrieval
///   results instead of an error; it indicates a caller bug, and the
///   pipeline should degrade to answering without context.
#[derive(Error, Debug)]
pub enum HubError {
    /// Identity verification failed or was absent
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller authenticated but lacks permission for the requested scope
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request rejected by the rate limiter
    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying LLM or embedding model invocation failed
    #[error("Model error: {0}")]
    Model(String),

    /// Vector store / retrieval backend failure
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        HubError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for HubError {
    fn from(err: serde_yaml::Error) -> Self {
        HubError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with HubError.
pub type HubResult<T> = Result<T, HubError>;
