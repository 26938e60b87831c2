//! Document ingestion pipeline.
//!
//! Extraction of text from file formats is an external capability behind
//! [`TextExtractor`]; the pipeline owns what follows: chunking, batch
//! embedding, and persistence of the document with its chunks.

use quorum_core::{HubError, HubResult};
use std::sync::Arc;

use crate::chunker::chunk_text;
use crate::domain::KnowledgeDomain;
use crate::embeddings::EmbeddingGateway;
use crate::store::VectorStore;
use crate::types::{IngestReport, KnowledgeChunk, KnowledgeDocument};

/// External text extraction capability: bytes → text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, data: &[u8], filename: &str) -> HubResult<String>;
}

/// Extractor for plain-text formats (txt, md, csv).
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, data: &[u8], _filename: &str) -> HubResult<String> {
        Ok(String::from_utf8_lossy(data).into_owned())
    }
}

/// Descriptor for a document being ingested.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub owner_id: String,
    pub client_id: Option<String>,
    pub title: String,
    pub filename: String,
    pub doc_type: String,
    pub is_shared: bool,
}

impl DocumentMeta {
    /// Create a descriptor with required fields.
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        filename: impl Into<String>,
        doc_type: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            client_id: None,
            title: title.into(),
            filename: filename.into(),
            doc_type: doc_type.into(),
            is_shared: false,
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

/// Ingestion pipeline: chunk, embed, persist.
pub struct IngestPipeline {
    store: Arc<dyn VectorStore>,
    gateway: Arc<EmbeddingGateway>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl IngestPipeline {
    /// Create a pipeline over a store and embedding gateway.
    pub fn new(
        store: Arc<dyn VectorStore>,
        gateway: Arc<EmbeddingGateway>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            store,
            gateway,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Ingest raw file bytes through an extractor.
    pub async fn ingest_bytes(
        &self,
        domain: KnowledgeDomain,
        extractor: &dyn TextExtractor,
        data: &[u8],
        meta: DocumentMeta,
    ) -> HubResult<IngestReport> {
        let text = extractor.extract(data, &meta.filename)?;
        self.ingest_text(domain, &text, meta, data.len() as u64).await
    }

    /// Ingest already-extracted text.
    pub async fn ingest_text(
        &self,
        domain: KnowledgeDomain,
        text: &str,
        meta: DocumentMeta,
        file_size: u64,
    ) -> HubResult<IngestReport> {
        if !domain.is_valid_doc_type(&meta.doc_type) {
            return Err(HubError::Other(format!(
                "doc_type must be one of: {}",
                domain.doc_types().join(", ")
            )));
        }

        let contents = chunk_text(text, self.chunk_size, self.chunk_overlap);
        if contents.is_empty() {
            return Err(HubError::Other(
                "No text content to ingest".to_string(),
            ));
        }

        let embeddings = self.gateway.embed_batch(&contents).await?;

        let mut doc = KnowledgeDocument::new(meta.owner_id, meta.title, meta.filename, meta.doc_type);
        doc.client_id = meta.client_id;
        doc.is_shared = meta.is_shared;
        doc.chunk_count = contents.len() as u32;
        doc.file_size = file_size;

        self.store.insert_document(domain, &doc)?;

        let chunks: Vec<KnowledgeChunk> = contents
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (content, embedding))| {
                KnowledgeChunk::new(doc.id, i as u32, content.clone()).with_embedding(embedding)
            })
            .collect();

        self.store.insert_chunks(domain, &chunks)?;

        tracing::info!(
            domain = domain.as_str(),
            document = %doc.id,
            chunks = chunks.len(),
            "Ingested document"
        );

        Ok(IngestReport {
            document_id: doc.id,
            filename: doc.filename,
            chunk_count: chunks.len(),
            char_count: text.len(),
        })
    }
}
