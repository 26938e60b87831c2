//! Quorum CLI
//!
//! Command-line surface for the Quorum hub: ask questions through the
//! dynamic-RAG pipeline, ingest documents into a knowledge domain, and
//! inspect store statistics.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, IngestCommand, StatsCommand};
use quorum_core::{logging, HubConfig, HubResult};
use std::path::PathBuf;

/// Quorum CLI - multi-agent RAG hub
#[derive(Parser, Debug)]
#[command(name = "quorum")]
#[command(about = "Multi-agent RAG hub", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (YAML)
    #[arg(short, long, global = true, env = "QUORUM_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the SQLite knowledge store
    #[arg(short, long, global = true, env = "QUORUM_STORE", default_value = "quorum.db")]
    store: PathBuf,

    /// Owner identity for scoping (tenant/user key)
    #[arg(short, long, global = true, env = "QUORUM_OWNER", default_value = "local")]
    owner: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question through the dynamic-RAG agent pipeline
    Ask(AskCommand),

    /// Ingest documents into a knowledge domain
    Ingest(IngestCommand),

    /// Show knowledge store statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> HubResult<()> {
    let cli = Cli::parse();

    let config = HubConfig::load(cli.config.as_deref())?;

    let log_level = if cli.verbose {
        Some("debug")
    } else {
        cli.log_level.as_deref()
    };
    logging::init_logging(log_level, cli.no_color)?;

    tracing::info!("Quorum CLI starting");
    tracing::debug!("Store: {:?}", cli.store);
    tracing::debug!("Owner: {}", cli.owner);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Ingest(_) => "ingest",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config, &cli.store, &cli.owner).await,
        Commands::Ingest(cmd) => cmd.execute(&config, &cli.store, &cli.owner).await,
        Commands::Stats(cmd) => cmd.execute(&cli.store).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
