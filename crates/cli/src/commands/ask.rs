//! Ask command handler.
//!
//! Drafts one email from a single request: one session, one turn, print
//! the draft, done.

use clap::Args;
use scribe_core::{config::AppConfig, AppError, AppResult};
use std::path::PathBuf;

/// Draft one email from a single request
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The drafting request (alternative to --file)
    pub request: Option<String>,

    /// Read the request from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Write the draft to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let request = self
            .get_request()
            .ok_or_else(|| AppError::Config("No request provided".to_string()))?;

        let store = super::open_store(config)?;
        let index = super::load_shared_index(&store, config.indexing.embedding_dim)?;
        let manager = super::build_manager(config, index)?;

        let id = manager.start_session().await;
        let reply = manager.send_message(id, &request).await?;
        manager.close_session(id).await?;

        if let Some(ref path) = self.output {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &reply.draft_text)?;
            println!("Draft written to {}", path.display());
            if reply.degraded {
                eprintln!("Note: retrieval was unavailable; drafted without document context");
            }
        } else if self.json {
            let output = serde_json::json!({
                "draft": reply.draft_text,
                "sources": reply.retrieved_sources,
                "degraded": reply.degraded,
                "model": config.model,
                "provider": config.provider,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", reply.draft_text);
            if !reply.retrieved_sources.is_empty() {
                eprintln!();
                eprintln!("Sources: {}", reply.retrieved_sources.join(", "));
            }
            if reply.degraded {
                eprintln!("Note: retrieval was unavailable; drafted without document context");
            }
        }

        Ok(())
    }

    fn get_request(&self) -> Option<String> {
        self.request.clone().or_else(|| {
            self.file.as_ref().and_then(|path| {
                std::fs::read_to_string(path)
                    .map_err(|e| tracing::error!("Failed to read request file: {}", e))
                    .ok()
            })
        })
    }
}
