use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use noteport::config::NoteportConfig;
use noteport::note::search::DEFAULT_CONTEXT_LENGTH;
use noteport::{cli, server};

#[derive(Parser)]
#[command(name = "noteport", version, about = "JSON-RPC gateway for a markdown notes vault")]
struct Cli {
    /// Path to config.toml (default: ~/.noteport/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway
    Serve,
    /// Search the vault from the terminal
    Search {
        query: String,
        /// Characters of context on each side of a match
        #[arg(long, default_value_t = DEFAULT_CONTEXT_LENGTH)]
        context: usize,
    },
    /// Check the vault and configuration
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => NoteportConfig::load_from(path)?,
        None => NoteportConfig::load()?,
    };

    // Log to stderr so stdout stays clean for CLI output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve_http(config).await?;
        }
        Command::Search { query, context } => {
            cli::search::search(&config, &query, context)?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config)?;
        }
    }

    Ok(())
}
