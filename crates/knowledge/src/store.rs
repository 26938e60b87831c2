//! Vector store abstraction for knowledge documents and chunks.
//!
//! The production nearest-neighbor store is an external capability; this
//! trait is the seam the core consumes. A SQLite reference backend ships
//! in [`crate::sqlite`].

use quorum_core::HubResult;
use uuid::Uuid;

use crate::domain::KnowledgeDomain;
use crate::types::{KnowledgeChunk, KnowledgeDocument, RetrievedChunk, Scope, StoreStats};

/// Trait for vector store backends.
///
/// Implementations must enforce, inside `search`:
/// - only chunks of active documents participate
/// - only chunks with a non-null embedding participate
/// - the ownership predicate: owner's own documents OR shared documents,
///   optionally narrowed to one client
/// - ascending distance order with deterministic tie-breaking
pub trait VectorStore: Send + Sync {
    /// Insert a document's metadata.
    fn insert_document(&self, domain: KnowledgeDomain, doc: &KnowledgeDocument) -> HubResult<()>;

    /// Insert a batch of chunks for an already-inserted document.
    fn insert_chunks(&self, domain: KnowledgeDomain, chunks: &[KnowledgeChunk]) -> HubResult<()>;

    /// Nearest-neighbor search under an ownership scope.
    ///
    /// Returns up to `limit` chunks joined with document metadata,
    /// nearest first.
    fn search(
        &self,
        domain: KnowledgeDomain,
        query: &[f32],
        scope: &Scope,
        limit: usize,
    ) -> HubResult<Vec<RetrievedChunk>>;

    /// Flip a document's soft-delete flag.
    fn set_document_active(
        &self,
        domain: KnowledgeDomain,
        document_id: Uuid,
        active: bool,
    ) -> HubResult<()>;

    /// Flip a document's shared flag.
    fn set_document_shared(
        &self,
        domain: KnowledgeDomain,
        document_id: Uuid,
        shared: bool,
    ) -> HubResult<()>;

    /// Delete a document and cascade to its chunks.
    fn delete_document(&self, domain: KnowledgeDomain, document_id: Uuid) -> HubResult<()>;

    /// Get document/chunk counts for a domain.
    fn stats(&self, domain: KnowledgeDomain) -> HubResult<StoreStats>;
}
