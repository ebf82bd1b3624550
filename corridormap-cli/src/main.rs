//! CorridorMap CLI - Command-line interface
//!
//! Drives the corridor acquisition pipeline and its diagnostics.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::run::RunArgs;
use error::CliError;
use runner::CommonArgs;

#[derive(Parser)]
#[command(name = "corridormap")]
#[command(version)]
#[command(about = "Acquire and convert map data for the Charlotte I-485 corridor", long_about = None)]
struct Cli {
    /// INI configuration file (compiled-in defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root of the data directory tree
    #[arg(long, global = true, default_value = runner::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the acquisition pipeline
    Run {
        /// Comma-separated step names to run (default: all)
        #[arg(long)]
        steps: Option<String>,

        /// Comma-separated zoom levels overriding the configured profile
        #[arg(long)]
        zoom: Option<String>,

        /// Order steps by their requirements instead of registration order
        #[arg(long)]
        topological: bool,

        /// Print the run summary as JSON (logs go to the log file only)
        #[arg(long)]
        json: bool,
    },

    /// List pipeline steps
    Steps {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the corridor center maps to the local origin
    Validate,

    /// Show corridor extent and tile counts per zoom level
    Info {
        /// Comma-separated zoom levels overriding the configured profile
        #[arg(long)]
        zoom: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let common = CommonArgs {
        config: cli.config,
        data_dir: Some(cli.data_dir),
    };

    let result: Result<(), CliError> = match cli.command {
        Commands::Run {
            steps,
            zoom,
            topological,
            json,
        } => commands::run::run(RunArgs {
            common,
            steps,
            zoom,
            topological,
            json,
        }),
        Commands::Steps { json } => commands::steps::run(common, json),
        Commands::Validate => commands::validate::run(common),
        Commands::Info { zoom, json } => commands::info::run(common, zoom, json),
    };

    if let Err(e) = result {
        e.exit();
    }
}
