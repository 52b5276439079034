//! Vote Anchor CLI
//!
//! Command-line interface for submitting vote codes through the gateway
//! and tracking their ledger receipts.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

/// Vote Anchor CLI - Submit vote codes and track their receipts.
#[derive(Parser, Debug)]
#[command(name = "voteanchor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gateway server URL.
    #[arg(long, default_value = "http://localhost:3000", global = true)]
    gateway: String,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a vote code.
    Submit {
        /// The vote code: four dash-separated groups of five digits.
        #[arg(short, long)]
        code: String,
    },

    /// Check the receipt status of a submitted vote.
    Status {
        /// Transaction hash returned at submission.
        #[arg(long)]
        hash: String,

        /// Keep polling until the receipt appears (Ctrl-C to stop).
        #[arg(short, long)]
        watch: bool,

        /// Poll interval in seconds when watching.
        #[arg(short, long, default_value = "10")]
        interval: u64,
    },

    /// Check gateway health.
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose {
        Level::TRACE
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Submit { code } => {
            commands::submit(&cli.gateway, &code).await?;
        }
        Commands::Status {
            hash,
            watch,
            interval,
        } => {
            commands::status(&cli.gateway, &hash, watch, interval).await?;
        }
        Commands::Health => {
            commands::health(&cli.gateway).await?;
        }
    }

    Ok(())
}
