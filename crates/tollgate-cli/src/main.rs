//! Tollgate CLI - standalone host for the provider approval mediator.
//!
//! `tollgate serve` reads page messages and wallet controls as JSON lines on
//! stdin and writes outbound messages and UI events as JSON lines on stdout.
//! Logs go to stderr.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod commands;
mod config_bridge;

use commands::serve::ServeOverrides;

/// Tollgate - wallet provider access mediator
#[derive(Parser)]
#[command(name = "tollgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to an extra configuration file, applied above the user file
    #[arg(short, long, global = true, env = "TOLLGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the mediator over stdin/stdout JSON lines
    Serve {
        /// Override privacy mode for this run
        #[arg(long)]
        privacy_mode: Option<bool>,

        /// Start with the wallet unlocked
        #[arg(long)]
        unlocked: bool,
    },

    /// View and check configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration with the layer that set each value
    Show,
    /// Validate the configuration and exit
    Validate,
    /// List the files checked during loading
    Paths,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { command } => commands::config::run(&command, cli.config.as_deref()),
        Commands::Serve {
            privacy_mode,
            unlocked,
        } => {
            let resolved = tollgate_config::load(cli.config.as_deref(), None)
                .context("failed to load configuration")?;

            let mut log_config = config_bridge::to_log_config(
                &resolved.config,
                std::io::stderr().is_terminal(),
            )?;
            if cli.verbose {
                "debug".clone_into(&mut log_config.level);
            }
            if let Err(e) = tollgate_telemetry::setup_logging(&log_config) {
                eprintln!("Failed to initialize logging: {e}");
            }

            let overrides = ServeOverrides {
                privacy_mode,
                unlocked,
            };
            let stats = commands::serve::run_stdio(&resolved.config, overrides).await?;
            tracing::info!(
                lines = stats.lines,
                ignored = stats.ignored,
                written = stats.written,
                "input closed, mediator stopped"
            );
            Ok(())
        },
    }
}
