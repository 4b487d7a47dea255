//! Lexrag CLI
//!
//! Entry point for the legal-corpus ingestion pipeline. Provides one
//! subcommand per pipeline stage (extract, enrich, upload) plus a stats
//! command for inspecting produced chunk files.

mod commands;

use clap::{Parser, Subcommand};
use commands::{EnrichCommand, ExtractCommand, StatsCommand, UploadCommand};
use lexrag_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Lexrag CLI - Spanish labor-law corpus ingestion for RAG
#[derive(Parser, Debug)]
#[command(name = "lexrag")]
#[command(about = "Spanish labor-law corpus ingestion for RAG", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "LEXRAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "LEXRAG_CONFIG")]
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

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract chunks from a document dump
    Extract(ExtractCommand),

    /// Enrich extracted chunks with summaries, keywords and questions
    Enrich(EnrichCommand),

    /// Embed enriched chunks and upload them to the search index
    Upload(UploadCommand),

    /// Show statistics for a chunk file
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
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Lexrag CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);

    // Emit command.start span
    let command_name = match &cli.command {
        Commands::Extract(_) => "extract",
        Commands::Enrich(_) => "enrich",
        Commands::Upload(_) => "upload",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Extract(cmd) => cmd.execute(&config).await,
        Commands::Enrich(cmd) => cmd.execute(&config).await,
        Commands::Upload(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
