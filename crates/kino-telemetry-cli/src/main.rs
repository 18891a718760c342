//! Kino Telemetry CLI - Trace replay for the playback event normalizer
//!
//! Features:
//! - Replay recorded raw player callbacks and print canonical events
//! - Inspect the per-platform heuristic profiles

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

/// Kino Telemetry CLI - Playback analytics toolkit
#[derive(Parser)]
#[command(name = "kino-telemetry")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Replay player callback traces through the event normalizer", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an NDJSON trace of host messages
    Replay {
        /// Path to the trace file
        trace: PathBuf,

        /// Platform (ios, android, unknown)
        #[arg(short, long, default_value = "unknown")]
        platform: String,

        /// Host starts the player paused
        #[arg(long)]
        paused: bool,

        /// Persist a viewer id for the session
        #[arg(long)]
        track_viewer: bool,

        /// Normalizer configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the platform profile table
    Profiles {
        /// Normalizer configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout carries the replay output
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    kino_telemetry::init();

    match cli.command {
        Commands::Replay { trace, platform, paused, track_viewer, config } => {
            commands::replay(&trace, &platform, paused, track_viewer, config, &cli.format).await?;
        }
        Commands::Profiles { config } => {
            commands::profiles(config, &cli.format)?;
        }
    }

    Ok(())
}
