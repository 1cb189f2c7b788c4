//! Command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "magellan",
    version,
    about = "Iterative research loop: plan searches, gather evidence, synthesize a cited report"
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a research query and stream session events
    Research(commands::research::ResearchArgs),
    /// Show the merged configuration
    Config(commands::config::ConfigArgs),
}

/// Report a command failure and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) {
    if json {
        let payload = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{payload}");
    } else {
        eprintln!("error: {err:#}");
    }
    std::process::exit(1);
}
