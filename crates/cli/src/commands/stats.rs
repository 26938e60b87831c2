//! Stats command handler.

use clap::Args;
use quorum_core::HubResult;
use quorum_knowledge::{KnowledgeDomain, SqliteStore, VectorStore};
use std::path::Path;

/// Show knowledge store statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    /// Execute the stats command.
    pub async fn execute(&self, store_path: &Path) -> HubResult<()> {
        let store = SqliteStore::open(store_path)?;

        let mut entries = Vec::new();
        for domain in KnowledgeDomain::ALL {
            let stats = store.stats(domain)?;
            entries.push((domain, stats));
        }

        if self.json {
            let value = serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(domain, stats)| {
                        (
                            domain.as_str().to_string(),
                            serde_json::json!({
                                "documents": stats.documents,
                                "chunks": stats.chunks,
                            }),
                        )
                    })
                    .collect(),
            );
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("{:<12} {:>10} {:>10}", "domain", "documents", "chunks");
            for (domain, stats) in entries {
                println!(
                    "{:<12} {:>10} {:>10}",
                    domain.as_str(),
                    stats.documents,
                    stats.chunks
                );
            }
        }

        Ok(())
    }
}
