//! Ingest command handler.
//!
//! Feeds files (or whole directories) through the ingestion pipeline
//! into one knowledge domain.

use clap::Args;
use quorum_core::{HubConfig, HubError, HubResult};
use quorum_knowledge::ingest::{DocumentMeta, IngestPipeline, PlainTextExtractor};
use quorum_knowledge::{EmbeddingGateway, KnowledgeDomain, SqliteStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Ingest documents into a knowledge domain
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// File or directory to ingest
    pub path: PathBuf,

    /// Knowledge domain (ghost, legal, query, insurance)
    #[arg(short, long, default_value = "legal")]
    pub domain: String,

    /// Document type (validated against the domain's allow-list)
    #[arg(short = 't', long)]
    pub doc_type: String,

    /// Document title (defaults to the file name)
    #[arg(long)]
    pub title: Option<String>,

    /// Mark the documents as shared across owners (e.g. regulatory texts)
    #[arg(long)]
    pub shared: bool,

    /// Tag the documents for one client within the tenant
    #[arg(long)]
    pub client: Option<String>,
}

impl IngestCommand {
    /// Execute the ingest command.
    pub async fn execute(
        &self,
        config: &HubConfig,
        store_path: &Path,
        owner: &str,
    ) -> HubResult<()> {
        let domain = KnowledgeDomain::parse(&self.domain).ok_or_else(|| {
            HubError::Other(format!(
                "Unknown domain '{}'. Use: ghost, legal, query, insurance",
                self.domain
            ))
        })?;

        let gateway = Arc::new(EmbeddingGateway::from_settings(&config.embedding)?);
        let store = Arc::new(SqliteStore::open(store_path)?);
        let pipeline = IngestPipeline::new(
            store,
            gateway,
            config.ingest.chunk_size,
            config.ingest.chunk_overlap,
        );

        let files = collect_files(&self.path)?;
        if files.is_empty() {
            return Err(HubError::Other(format!(
                "No ingestible files under {:?}",
                self.path
            )));
        }

        for file in files {
            let data = std::fs::read(&file)?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string());
            let title = self.title.clone().unwrap_or_else(|| filename.clone());

            let mut meta = DocumentMeta::new(owner, title, filename, self.doc_type.as_str());
            meta.is_shared = self.shared;
            meta.client_id = self.client.clone();

            let report = pipeline
                .ingest_bytes(domain, &PlainTextExtractor, &data, meta)
                .await?;

            println!(
                "Ingested {} -> {} chunks ({} chars), document {}",
                file.display(),
                report.chunk_count,
                report.char_count,
                report.document_id
            );
        }

        Ok(())
    }
}

/// Collect ingestible files: the path itself, or text files under a
/// directory.
fn collect_files(path: &Path) -> HubResult<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|ext| ext.to_str()),
                Some("txt" | "md" | "csv")
            )
        })
        .collect();

    files.sort();
    Ok(files)
}
