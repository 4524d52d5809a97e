//! Kotoba: incremental mirror of the Marugoto vocabulary catalog.
//!
//! # Usage
//!
//! ```text
//! kotoba init [--base-url URL] [--output-dir DIR] [--force]
//! kotoba words [--language L]... [--level V]...
//! kotoba audio [--level V]... [--concurrency N] [--retries N] [--strict]
//! kotoba all
//! kotoba status [--json]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    all::AllArgs, audio::AudioArgs, init::InitArgs, status::StatusArgs, words::WordsArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "kotoba",
    version,
    about = "Mirror Marugoto vocabulary lists and audio into a local directory",
    long_about = None,
)]
struct Cli {
    /// Config file to use instead of ~/.kotoba/config.yaml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default config file.
    Init(InitArgs),

    /// Export the word lists as pipe-delimited CSV files.
    Words(WordsArgs),

    /// Mirror the audio assets of each level.
    Audio(AudioArgs),

    /// Export every word list, then mirror every level's audio.
    All(AllArgs),

    /// Show what is in the local mirror (no network).
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let config_path = commands::resolve_config_path(cli.config)?;
    match cli.command {
        Commands::Init(args) => args.run(&config_path),
        Commands::Words(args) => args.run(&config_path).await,
        Commands::Audio(args) => args.run(&config_path).await,
        Commands::All(args) => args.run(&config_path).await,
        Commands::Status(args) => args.run(&config_path),
    }
}

fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
