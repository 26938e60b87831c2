//! Scope-filtered knowledge retrieval.
//!
//! The retriever validates the caller's domain selector against the
//! closed allow-list before touching the store: an unrecognized domain
//! returns empty results rather than attempting arbitrary lookup. This
//! is the one fail-closed choice in the pipeline — under-retrieving is
//! acceptable, cross-tenant leakage is not.

use quorum_core::HubResult;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::KnowledgeDomain;
use crate::store::VectorStore;
use crate::types::{RetrievedChunk, Scope, SourceRef};

/// Maximum characters of chunk content rendered into the prompt block.
const CONTEXT_SNIPPET_CHARS: usize = 600;

/// Knowledge retriever over a vector store.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    default_limit: usize,
}

impl Retriever {
    /// Create a retriever with a default result limit.
    pub fn new(store: Arc<dyn VectorStore>, default_limit: usize) -> Self {
        Self {
            store,
            default_limit,
        }
    }

    /// Retrieve the nearest chunks for a query vector under a scope.
    ///
    /// `domain` is a caller-supplied selector; anything outside the
    /// allow-list yields an empty result (warn-logged, not an error).
    /// Results ascend by distance, ties broken by chunk id. Read-only.
    pub fn retrieve(
        &self,
        query_vector: &[f32],
        scope: &Scope,
        domain: &str,
        limit: Option<usize>,
    ) -> HubResult<Vec<RetrievedChunk>> {
        let Some(domain) = KnowledgeDomain::parse(domain) else {
            tracing::warn!(domain, "Unknown knowledge domain, returning no chunks");
            return Ok(Vec::new());
        };

        self.store.search(
            domain,
            query_vector,
            scope,
            limit.unwrap_or(self.default_limit),
        )
    }
}

/// Format retrieved chunks into a prompt context block.
///
/// Empty input yields an empty string (the prompt then carries no
/// knowledge section at all).
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    if chunks.is_empty() {
        return String::new();
    }

    let lines: Vec<String> = chunks
        .iter()
        .map(|c| {
            format!(
                "[{}] {} - {}",
                c.doc_type.to_uppercase(),
                c.title,
                truncate_chars(&c.content, CONTEXT_SNIPPET_CHARS)
            )
        })
        .collect();

    format!("[KNOWLEDGE_BASE]\n{}", lines.join("\n"))
}

/// Deduplicate retrieved chunks into per-document citations, preserving
/// retrieval order.
pub fn dedup_sources(chunks: &[RetrievedChunk]) -> Vec<SourceRef> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for chunk in chunks {
        if !chunk.title.is_empty() && seen.insert(chunk.title.clone()) {
            sources.push(SourceRef {
                title: chunk.title.clone(),
                doc_type: chunk.doc_type.clone(),
            });
        }
    }

    sources
}

/// Truncate to a character budget without splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
