//! SQLite-backed vector store.
//!
//! Reference implementation of [`VectorStore`]: one document/chunk table
//! pair per knowledge domain, embeddings stored as little-endian f32
//! blobs, distance ranking computed in process. Table names come from
//! the [`KnowledgeDomain`] lookup, never from caller strings.

use quorum_core::{HubError, HubResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::KnowledgeDomain;
use crate::embeddings::cosine_similarity;
use crate::store::VectorStore;
use crate::types::{KnowledgeChunk, KnowledgeDocument, RetrievedChunk, Scope, StoreStats};

/// SQLite vector store.
///
/// The connection is serialized behind a mutex; callers share the store
/// via `Arc<SqliteStore>`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open(db_path: &Path) -> HubResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HubError::Retrieval(format!("Failed to create store directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| HubError::Retrieval(format!("Failed to open SQLite store: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        tracing::debug!("Initialized SQLite store at {:?}", db_path);
        Ok(store)
    }

    /// Open an in-memory store (tests and throwaway sessions).
    pub fn open_in_memory() -> HubResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| HubError::Retrieval(format!("Failed to open SQLite store: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> HubResult<()> {
        let conn = self.lock()?;

        for domain in KnowledgeDomain::ALL {
            let p = domain.table_prefix();
            conn.execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {p}_documents (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    filename TEXT NOT NULL,
                    doc_type TEXT NOT NULL,
                    owner_id TEXT NOT NULL,
                    client_id TEXT,
                    is_shared INTEGER NOT NULL DEFAULT 0,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    chunk_count INTEGER NOT NULL DEFAULT 0,
                    file_size INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS {p}_chunks (
                    id TEXT PRIMARY KEY,
                    document_id TEXT NOT NULL,
                    content TEXT NOT NULL,
                    chunk_index INTEGER NOT NULL,
                    section_ref TEXT,
                    embedding BLOB,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (document_id) REFERENCES {p}_documents(id)
                );

                CREATE INDEX IF NOT EXISTS idx_{p}_chunks_document
                    ON {p}_chunks(document_id);
                CREATE INDEX IF NOT EXISTS idx_{p}_documents_owner
                    ON {p}_documents(owner_id);
                "#
            ))
            .map_err(|e| HubError::Retrieval(format!("Failed to create tables: {}", e)))?;
        }

        Ok(())
    }

    fn lock(&self) -> HubResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| HubError::Retrieval("Store lock poisoned".to_string()))
    }
}

impl VectorStore for SqliteStore {
    fn insert_document(&self, domain: KnowledgeDomain, doc: &KnowledgeDocument) -> HubResult<()> {
        let conn = self.lock()?;
        let p = domain.table_prefix();

        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {p}_documents
                 (id, title, filename, doc_type, owner_id, client_id,
                  is_shared, is_active, chunk_count, file_size, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                doc.id.to_string(),
                doc.title,
                doc.filename,
                doc.doc_type,
                doc.owner_id,
                doc.client_id,
                doc.is_shared,
                doc.is_active,
                doc.chunk_count,
                doc.file_size as i64,
                doc.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| HubError::Retrieval(format!("Failed to insert document: {}", e)))?;

        Ok(())
    }

    fn insert_chunks(&self, domain: KnowledgeDomain, chunks: &[KnowledgeChunk]) -> HubResult<()> {
        let conn = self.lock()?;
        let p = domain.table_prefix();

        for chunk in chunks {
            let embedding_bytes = chunk.embedding.as_ref().map(|e| embedding_to_bytes(e));

            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {p}_chunks
                     (id, document_id, content, chunk_index, section_ref, embedding, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                params![
                    chunk.id.to_string(),
                    chunk.document_id.to_string(),
                    chunk.content,
                    chunk.chunk_index,
                    chunk.section_ref,
                    embedding_bytes,
                    chunk.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| HubError::Retrieval(format!("Failed to insert chunk: {}", e)))?;
        }

        Ok(())
    }

    fn search(
        &self,
        domain: KnowledgeDomain,
        query: &[f32],
        scope: &Scope,
        limit: usize,
    ) -> HubResult<Vec<RetrievedChunk>> {
        let conn = self.lock()?;
        let p = domain.table_prefix();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT c.id, c.document_id, c.content, c.chunk_index, c.section_ref,
                        c.embedding, d.title, d.doc_type
                 FROM {p}_chunks c
                 JOIN {p}_documents d ON c.document_id = d.id
                 WHERE d.is_active = 1
                   AND c.embedding IS NOT NULL
                   AND (d.owner_id = ?1 OR d.is_shared = 1)
                   AND (?2 IS NULL OR d.client_id IS NULL OR d.client_id = ?2)"
            ))
            .map_err(|e| HubError::Retrieval(format!("Failed to prepare search: {}", e)))?;

        let rows = stmt
            .query_map(params![scope.owner_id, scope.client_id], |row| {
                let id: String = row.get(0)?;
                let document_id: String = row.get(1)?;
                let embedding_bytes: Vec<u8> = row.get(5)?;

                Ok((
                    id,
                    document_id,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)? as u32,
                    row.get::<_, Option<String>>(4)?,
                    embedding_bytes,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })
            .map_err(|e| HubError::Retrieval(format!("Failed to query chunks: {}", e)))?;

        let mut results = Vec::new();
        for row in rows {
            let (id, document_id, content, chunk_index, section_ref, embedding_bytes, title, doc_type) =
                row.map_err(|e| HubError::Retrieval(format!("Failed to read row: {}", e)))?;

            let chunk_id = Uuid::parse_str(&id)
                .map_err(|e| HubError::Retrieval(format!("Corrupt chunk id: {}", e)))?;
            let document_id = Uuid::parse_str(&document_id)
                .map_err(|e| HubError::Retrieval(format!("Corrupt document id: {}", e)))?;
            let embedding = bytes_to_embedding(&embedding_bytes)?;

            let distance = 1.0 - cosine_similarity(query, &embedding);

            results.push(RetrievedChunk {
                chunk_id,
                document_id,
                content,
                chunk_index,
                section_ref,
                title,
                doc_type,
                distance,
            });
        }

        // Nearest first; ties broken by chunk id for reproducibility
        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        results.truncate(limit);

        tracing::debug!(
            domain = domain.as_str(),
            returned = results.len(),
            "Vector search"
        );

        Ok(results)
    }

    fn set_document_active(
        &self,
        domain: KnowledgeDomain,
        document_id: Uuid,
        active: bool,
    ) -> HubResult<()> {
        let conn = self.lock()?;
        let p = domain.table_prefix();

        conn.execute(
            &format!("UPDATE {p}_documents SET is_active = ?1 WHERE id = ?2"),
            params![active, document_id.to_string()],
        )
        .map_err(|e| HubError::Retrieval(format!("Failed to update document: {}", e)))?;

        Ok(())
    }

    fn set_document_shared(
        &self,
        domain: KnowledgeDomain,
        document_id: Uuid,
        shared: bool,
    ) -> HubResult<()> {
        let conn = self.lock()?;
        let p = domain.table_prefix();

        conn.execute(
            &format!("UPDATE {p}_documents SET is_shared = ?1 WHERE id = ?2"),
            params![shared, document_id.to_string()],
        )
        .map_err(|e| HubError::Retrieval(format!("Failed to update document: {}", e)))?;

        Ok(())
    }

    fn delete_document(&self, domain: KnowledgeDomain, document_id: Uuid) -> HubResult<()> {
        let conn = self.lock()?;
        let p = domain.table_prefix();
        let id = document_id.to_string();

        conn.execute(
            &format!("DELETE FROM {p}_chunks WHERE document_id = ?1"),
            params![id],
        )
        .map_err(|e| HubError::Retrieval(format!("Failed to delete chunks: {}", e)))?;

        conn.execute(
            &format!("DELETE FROM {p}_documents WHERE id = ?1"),
            params![id],
        )
        .map_err(|e| HubError::Retrieval(format!("Failed to delete document: {}", e)))?;

        Ok(())
    }

    fn stats(&self, domain: KnowledgeDomain) -> HubResult<StoreStats> {
        let conn = self.lock()?;
        let p = domain.table_prefix();

        let documents: u32 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {p}_documents"), [], |row| {
                row.get::<_, i64>(0).map(|v| v as u32)
            })
            .optional()
            .map_err(|e| HubError::Retrieval(format!("Failed to count documents: {}", e)))?
            .unwrap_or(0);

        let chunks: u32 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {p}_chunks"), [], |row| {
                row.get::<_, i64>(0).map(|v| v as u32)
            })
            .optional()
            .map_err(|e| HubError::Retrieval(format!("Failed to count chunks: {}", e)))?
            .unwrap_or(0);

        Ok(StoreStats { documents, chunks })
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> HubResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(HubError::Retrieval(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        embedding.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> (SqliteStore, KnowledgeDocument) {
        let store = SqliteStore::open_in_memory().unwrap();
        let doc = KnowledgeDocument::new("tenant-a", "Group Policy", "policy.pdf", "contract");
        store.insert_document(KnowledgeDomain::Legal, &doc).unwrap();

        let chunks = vec![
            KnowledgeChunk::new(doc.id, 0, "termination clause").with_embedding(vec![1.0, 0.0, 0.0]),
            KnowledgeChunk::new(doc.id, 1, "payment terms").with_embedding(vec![0.0, 1.0, 0.0]),
        ];
        store.insert_chunks(KnowledgeDomain::Legal, &chunks).unwrap();

        (store, doc)
    }

    #[test]
    fn test_search_orders_by_distance() {
        let (store, _doc) = seeded_store();

        let results = store
            .search(
                KnowledgeDomain::Legal,
                &[1.0, 0.0, 0.0],
                &Scope::owner("tenant-a"),
                8,
            )
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "termination clause");
        assert!(results[0].distance < results[1].distance);
    }

    #[test]
    fn test_search_excludes_other_owners() {
        let (store, _doc) = seeded_store();

        let other = KnowledgeDocument::new("tenant-b", "Private Memo", "memo.txt", "opinion");
        store.insert_document(KnowledgeDomain::Legal, &other).unwrap();
        store
            .insert_chunks(
                KnowledgeDomain::Legal,
                &[KnowledgeChunk::new(other.id, 0, "tenant-b secret")
                    .with_embedding(vec![1.0, 0.0, 0.0])],
            )
            .unwrap();

        let results = store
            .search(
                KnowledgeDomain::Legal,
                &[1.0, 0.0, 0.0],
                &Scope::owner("tenant-a"),
                8,
            )
            .unwrap();

        assert!(results.iter().all(|c| c.content != "tenant-b secret"));
    }

    #[test]
    fn test_search_includes_shared_documents() {
        let (store, _doc) = seeded_store();

        let shared =
            KnowledgeDocument::new("tenant-b", "National Regulation", "reg.pdf", "regulation")
                .shared();
        store.insert_document(KnowledgeDomain::Legal, &shared).unwrap();
        store
            .insert_chunks(
                KnowledgeDomain::Legal,
                &[KnowledgeChunk::new(shared.id, 0, "article 12 applies")
                    .with_embedding(vec![1.0, 0.0, 0.0])],
            )
            .unwrap();

        let results = store
            .search(
                KnowledgeDomain::Legal,
                &[1.0, 0.0, 0.0],
                &Scope::owner("tenant-a"),
                8,
            )
            .unwrap();

        assert!(results.iter().any(|c| c.content == "article 12 applies"));
    }

    #[test]
    fn test_search_excludes_inactive_documents() {
        let (store, doc) = seeded_store();

        store
            .set_document_active(KnowledgeDomain::Legal, doc.id, false)
            .unwrap();

        let results = store
            .search(
                KnowledgeDomain::Legal,
                &[1.0, 0.0, 0.0],
                &Scope::owner("tenant-a"),
                8,
            )
            .unwrap();

        assert!(results.is_empty());
    }

    #[test]
    fn test_search_excludes_chunks_without_embedding() {
        let (store, doc) = seeded_store();

        store
            .insert_chunks(
                KnowledgeDomain::Legal,
                &[KnowledgeChunk::new(doc.id, 2, "not yet embedded")],
            )
            .unwrap();

        let results = store
            .search(
                KnowledgeDomain::Legal,
                &[1.0, 0.0, 0.0],
                &Scope::owner("tenant-a"),
                8,
            )
            .unwrap();

        assert!(results.iter().all(|c| c.content != "not yet embedded"));
    }

    #[test]
    fn test_client_narrowing() {
        let store = SqliteStore::open_in_memory().unwrap();

        let tenant_wide =
            KnowledgeDocument::new("broker-1", "ANS Norm 465", "ans.pdf", "ans_norm");
        let client_a = KnowledgeDocument::new("broker-1", "Acme Policy", "acme.pdf", "policy")
            .with_client("acme");
        let client_b = KnowledgeDocument::new("broker-1", "Globex Policy", "globex.pdf", "policy")
            .with_client("globex");

        for doc in [&tenant_wide, &client_a, &client_b] {
            store.insert_document(KnowledgeDomain::Insurance, doc).unwrap();
            store
                .insert_chunks(
                    KnowledgeDomain::Insurance,
                    &[KnowledgeChunk::new(doc.id, 0, doc.title.clone())
                        .with_embedding(vec![1.0, 0.0])],
                )
                .unwrap();
        }

        let results = store
            .search(
                KnowledgeDomain::Insurance,
                &[1.0, 0.0],
                &Scope::narrowed("broker-1", "acme"),
                8,
            )
            .unwrap();

        let titles: Vec<&str> = results.iter().map(|c| c.title.as_str()).collect();
        assert!(titles.contains(&"ANS Norm 465"));
        assert!(titles.contains(&"Acme Policy"));
        assert!(!titles.contains(&"Globex Policy"));
    }

    #[test]
    fn test_delete_document_cascades() {
        let (store, doc) = seeded_store();

        store.delete_document(KnowledgeDomain::Legal, doc.id).unwrap();

        let stats = store.stats(KnowledgeDomain::Legal).unwrap();
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.chunks, 0);
    }

    #[test]
    fn test_domains_are_partitioned() {
        let (store, _doc) = seeded_store();

        let results = store
            .search(
                KnowledgeDomain::Ghost,
                &[1.0, 0.0, 0.0],
                &Scope::owner("tenant-a"),
                8,
            )
            .unwrap();

        assert!(results.is_empty());
    }

    #[test]
    fn test_open_creates_schema_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("knowledge/store.db");

        let store = SqliteStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.stats(KnowledgeDomain::Query).unwrap().documents, 0);
    }

    #[test]
    fn test_embedding_roundtrip() {
        let original = vec![0.25, -1.5, 3.75];
        let bytes = embedding_to_bytes(&original);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), original);
        assert!(bytes_to_embedding(&bytes[..5]).is_err());
    }
}
