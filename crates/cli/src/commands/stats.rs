//! Stats command handler.
//!
//! Reports what the persistent index currently holds.

use clap::Args;
use scribe_core::{config::AppConfig, AppResult};

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let store = super::open_store(config)?;
        let sources = {
            let store = store.lock().unwrap_or_else(|e| e.into_inner());
            store.list_sources()?
        };

        let total_chunks: usize = sources.iter().map(|s| s.chunk_count).sum();
        let total_bytes: usize = sources.iter().map(|s| s.byte_count).sum();

        if self.json {
            let output = serde_json::json!({
                "indexPath": config.index_db_path(),
                "sources": sources
                    .iter()
                    .map(|s| serde_json::json!({
                        "sourceId": s.source_id,
                        "indexedAt": s.indexed_at.to_rfc3339(),
                        "chunks": s.chunk_count,
                        "bytes": s.byte_count,
                    }))
                    .collect::<Vec<_>>(),
                "totalChunks": total_chunks,
                "totalBytes": total_bytes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Index: {:?}", config.index_db_path());
            if sources.is_empty() {
                println!("No documents indexed. Use `scribe ingest <path>` to add some.");
                return Ok(());
            }
            for source in &sources {
                println!(
                    "  {}  {} chunks, {} bytes, indexed {}",
                    source.source_id,
                    source.chunk_count,
                    source.byte_count,
                    source.indexed_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            println!("Total: {} documents, {} chunks", sources.len(), total_chunks);
        }

        Ok(())
    }
}
