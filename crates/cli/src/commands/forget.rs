//! Forget command handler.
//!
//! Removes a previously indexed document from the index and the store.

use clap::Args;
use scribe_core::{config::AppConfig, AppResult};

/// Remove a document from the index
#[derive(Args, Debug)]
pub struct ForgetCommand {
    /// Source id of the document to remove (as shown by `scribe stats`)
    pub source_id: String,
}

impl ForgetCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing forget command for '{}'", self.source_id);

        let store = super::open_store(config)?;
        let index = super::load_shared_index(&store, config.indexing.embedding_dim)?;
        let indexer = super::build_indexer(config, store, index)?;

        let removed = indexer.delete_document(&self.source_id).await?;
        if removed == 0 {
            println!("No indexed document named '{}'", self.source_id);
        } else {
            println!("Removed {} ({} chunks)", self.source_id, removed);
        }

        Ok(())
    }
}
