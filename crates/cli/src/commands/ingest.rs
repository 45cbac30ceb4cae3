//! Ingest command handler.
//!
//! Indexes a file or a directory tree of text documents for retrieval.

use clap::Args;
use scribe_core::{config::AppConfig, AppError, AppResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Index documents for retrieval
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// File or directory to index
    pub path: PathBuf,

    /// File extensions to include when indexing a directory
    #[arg(short, long, default_values = ["md", "txt"])]
    pub extensions: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {:?}", self.path);

        if !self.path.exists() {
            return Err(AppError::Config(format!(
                "Path does not exist: {:?}",
                self.path
            )));
        }

        let store = super::open_store(config)?;
        let index = super::load_shared_index(&store, config.indexing.embedding_dim)?;
        let indexer = super::build_indexer(config, store, index)?;

        let files = self.collect_files()?;
        if files.is_empty() {
            return Err(AppError::Config(format!(
                "No files with extensions [{}] under {:?}",
                self.extensions.join(", "),
                self.path
            )));
        }

        let mut indexed = Vec::new();
        let mut skipped = 0usize;
        for file in &files {
            let source_id = self.source_id_for(file);
            let text = match std::fs::read_to_string(file) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", file, e);
                    skipped += 1;
                    continue;
                }
            };

            let chunks = indexer.submit_document(&source_id, &text).await?;
            indexed.push((source_id, chunks));
        }

        if self.json {
            let output = serde_json::json!({
                "indexed": indexed
                    .iter()
                    .map(|(source_id, chunks)| serde_json::json!({
                        "sourceId": source_id,
                        "chunks": chunks,
                    }))
                    .collect::<Vec<_>>(),
                "skipped": skipped,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for (source_id, chunks) in &indexed {
                println!("Indexed {} ({} chunks)", source_id, chunks);
            }
            if skipped > 0 {
                println!("Skipped {} unreadable files", skipped);
            }
        }

        Ok(())
    }

    /// Collect the files to index: the path itself, or a filtered walk of
    /// the directory tree.
    fn collect_files(&self) -> AppResult<Vec<PathBuf>> {
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.path).follow_links(false) {
            let entry = entry.map_err(|e| {
                AppError::Config(format!("Failed to walk {:?}: {}", self.path, e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
                .unwrap_or(false);
            if matches {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Stable source id: path relative to the ingest root where possible.
    fn source_id_for(&self, file: &Path) -> String {
        let relative = if self.path.is_dir() {
            file.strip_prefix(&self.path).unwrap_or(file)
        } else {
            file
        };
        relative.to_string_lossy().into_owned()
    }
}
