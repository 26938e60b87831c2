//! Quorum Knowledge Library
//!
//! Tenant-scoped knowledge retrieval for the hub:
//! - Data model: documents, chunks, ownership scopes, domains
//! - Embedding providers behind a cached gateway
//! - Chunking and the ingestion pipeline
//! - Vector store seam with a SQLite reference backend
//! - The scope-filtered retriever

pub mod chunker;
pub mod domain;
pub mod embeddings;
pub mod ingest;
pub mod retriever;
pub mod sqlite;
pub mod store;
pub mod types;

pub use domain::KnowledgeDomain;
pub use embeddings::{cosine_similarity, EmbeddingGateway};
pub use retriever::Retriever;
pub use sqlite::SqliteStore;
pub use store::VectorStore;
pub use types::{
    IngestReport, KnowledgeChunk, KnowledgeDocument, RetrievedChunk, Scope, SourceRef, StoreStats,
};
