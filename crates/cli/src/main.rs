//! Scribe CLI
//!
//! Main entry point for the scribe command-line tool.
//! Provides retrieval-grounded email drafting over local documents.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, ForgetCommand, IngestCommand, StatsCommand, TemplateCommand};
use scribe_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Scribe CLI - retrieval-grounded email drafting
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(about = "Draft emails grounded in your own documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "SCRIBE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "SCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama, mock)
    #[arg(short, long, global = true, env = "SCRIBE_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "SCRIBE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index documents for retrieval
    Ingest(IngestCommand),

    /// Remove a document from the index
    Forget(ForgetCommand),

    /// Draft one email from a single request
    Ask(AskCommand),

    /// Interactive drafting session with feedback
    Chat(ChatCommand),

    /// Print an email starter template
    Template(TemplateCommand),

    /// Show index statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Scribe CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    // Ensure .scribe directory exists
    config.ensure_scribe_dir()?;

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Forget(_) => "forget",
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Template(_) => "template",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Forget(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Template(cmd) => cmd.execute(),
        Commands::Stats(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
