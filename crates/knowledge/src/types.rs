//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata for an ingested source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    /// Unique document identifier
    pub id: Uuid,

    /// Human-readable title
    pub title: String,

    /// Original filename
    pub filename: String,

    /// Document type, validated against the owning domain's allow-list
    pub doc_type: String,

    /// Owning tenant/user key
    pub owner_id: String,

    /// Optional sub-owner (e.g. a specific client within a tenant)
    pub client_id: Option<String>,

    /// Visible across owners when true (e.g. regulatory texts)
    pub is_shared: bool,

    /// Soft-delete flag; inactive documents never surface in retrieval
    pub is_active: bool,

    /// Number of chunks produced at ingestion
    pub chunk_count: u32,

    /// Source size in bytes
    pub file_size: u64,

    /// When this document was ingested
    pub created_at: DateTime<Utc>,
}

impl KnowledgeDocument {
    /// Create a new active, unshared document.
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        filename: impl Into<String>,
        doc_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            filename: filename.into(),
            doc_type: doc_type.into(),
            owner_id: owner_id.into(),
            client_id: None,
            is_shared: false,
            is_active: true,
            chunk_count: 0,
            file_size: 0,
            created_at: Utc::now(),
        }
    }

    /// Narrow ownership to a specific client.
    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Mark the document as shared across owners.
    pub fn shared(mut self) -> Self {
        self.is_shared = true;
        self
    }
}

/// A unit of retrievable text.
///
/// Chunks belong to exactly one document; `chunk_index` is zero-based,
/// contiguous, unique within the document, and defines reassembly order.
/// Chunks are immutable after ingestion and removed only by document
/// cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique chunk identifier
    pub id: Uuid,

    /// Owning document
    pub document_id: Uuid,

    /// Text content
    pub content: String,

    /// Sequence position within the document
    pub chunk_index: u32,

    /// Structural reference, e.g. "Art. 5 §2" or "Clause 5.2"
    pub section_ref: Option<String>,

    /// Embedding vector (fixed dimensionality)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// When this chunk was created
    pub created_at: DateTime<Utc>,
}

impl KnowledgeChunk {
    /// Create a chunk without an embedding.
    pub fn new(document_id: Uuid, chunk_index: u32, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content: content.into(),
            chunk_index,
            section_ref: None,
            embedding: None,
            created_at: Utc::now(),
        }
    }

    /// Attach an embedding vector.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Ownership filter for retrieval.
///
/// Matches the owner's own documents plus documents marked shared;
/// `client_id` narrows further to one client within the tenant (documents
/// tagged for another client are excluded, tenant-wide documents remain
/// visible).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub owner_id: String,
    pub client_id: Option<String>,
}

impl Scope {
    /// Scope over everything the owner can see.
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            client_id: None,
        }
    }

    /// Scope narrowed to one client within the tenant.
    pub fn narrowed(owner_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            client_id: Some(client_id.into()),
        }
    }
}

/// A chunk returned by retrieval, joined with its document metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    pub chunk_index: u32,
    pub section_ref: Option<String>,

    /// Title of the owning document
    pub title: String,

    /// Type of the owning document
    pub doc_type: String,

    /// Cosine distance to the query (lower is nearer)
    pub distance: f32,
}

/// A deduplicated citation for caller display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub doc_type: String,
}

/// Summary returned by the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: Uuid,
    pub filename: String,
    pub chunk_count: usize,
    pub char_count: usize,
}

/// Per-domain store statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoreStats {
    pub documents: u32,
    pub chunks: u32,
}
