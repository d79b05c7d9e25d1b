//! Research CLI - command-line access to hypothesis storage
//!
//! Lets an operator inspect sessions, look up and search hypotheses, delete
//! records, import validated records from JSON, and rebuild or query the
//! derived index.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use research_store::{HypothesisStorage, StorageConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;

use commands::{hypothesis, index};
use error::CliResult;
use output::OutputFormat;

/// Research CLI application
#[derive(Parser)]
#[command(name = "research")]
#[command(about = "Research hypothesis storage and index", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "RESEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Base directory containing .research/
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Hypothesis(hypothesis::HypothesisCommands),

    /// Derived index operations
    Index {
        #[command(subcommand)]
        command: index::IndexCommands,
    },

    /// Show effective configuration
    Config,
}

fn load_config(path: Option<&Path>, base_dir: Option<PathBuf>) -> CliResult<StorageConfig> {
    let config = match path {
        Some(path) => StorageConfig::load(path)?,
        None => StorageConfig::default(),
    };
    let mut config = config.with_env_overrides()?;
    if let Some(base_dir) = base_dir {
        config.base_dir = base_dir;
    }
    Ok(config)
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref(), cli.base_dir)?;
    tracing::debug!(base_dir = %config.base_dir.display(), "Using storage configuration");

    if let Commands::Config = cli.command {
        return output::print_single(&config);
    }

    let storage = HypothesisStorage::new(config);
    match cli.command {
        Commands::Hypothesis(command) => hypothesis::execute(command, &storage, cli.output).await,
        Commands::Index { command } => index::execute(command, &storage, cli.output).await,
        Commands::Config => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(cli).await {
        output::print_error(&err.to_string());
        std::process::exit(1);
    }
}
