//! Embedding provider implementations.

pub mod http;
pub mod trigram;

pub use http::HttpEmbeddingProvider;
pub use trigram::TrigramProvider;
