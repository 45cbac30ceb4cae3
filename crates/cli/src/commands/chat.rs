//! Chat command handler.
//!
//! Interactive drafting loop: each line is a request or a refinement of
//! the pending draft, with colon-commands for session control.

use clap::Args;
use scribe_core::{config::AppConfig, AppResult};
use scribe_prompt::save_draft;
use std::io::{BufRead, Write};

/// Interactive drafting session with feedback
#[derive(Args, Debug)]
pub struct ChatCommand {}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let store = super::open_store(config)?;
        let index = super::load_shared_index(&store, config.indexing.embedding_dim)?;
        let manager = super::build_manager(config, index)?;

        println!("Scribe interactive drafting. Describe the email you need.");
        println!("Commands: :accept [name]  save the draft and start over");
        println!("          :new            discard the draft and start over");
        println!("          :quit           exit");
        println!();

        let mut session = manager.start_session().await;
        let stdin = std::io::stdin();

        loop {
            print!("> ");
            std::io::stdout().flush().ok();

            let mut line = String::new();
            if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
                break; // EOF
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line {
                ":quit" => {
                    manager.close_session(session).await?;
                    break;
                }
                accept if accept.starts_with(":accept") => {
                    let filename = accept[":accept".len()..].trim();
                    let filename = (!filename.is_empty()).then_some(filename);

                    let draft = manager.last_draft(session).await?;
                    match manager.accept_draft(session).await {
                        Ok(()) => {
                            if let Some(content) = draft {
                                let path = save_draft(&content, filename, &config.drafts_dir())?;
                                println!("Draft accepted and saved to {}", path.display());
                            } else {
                                println!("Draft accepted.");
                            }
                        }
                        Err(e) => {
                            println!("{}", e);
                            continue;
                        }
                    }
                    session = manager.start_session().await;
                    println!("New session started.");
                }
                ":new" => {
                    manager.close_session(session).await?;
                    session = manager.start_session().await;
                    println!("New session started.");
                }
                request => match manager.send_message(session, request).await {
                    Ok(reply) => {
                        println!();
                        println!("{}", reply.draft_text);
                        println!();
                        if !reply.retrieved_sources.is_empty() {
                            println!("[sources: {}]", reply.retrieved_sources.join(", "));
                        }
                        if reply.degraded {
                            println!("[retrieval unavailable; drafted without document context]");
                        }
                        println!("Reply to refine, or :accept to keep this draft.");
                    }
                    Err(e) => {
                        println!("Error: {}", e);
                        if e.is_transient() {
                            println!("This looks temporary; try again.");
                        }
                    }
                },
            }
        }

        println!("Goodbye.");
        Ok(())
    }
}
