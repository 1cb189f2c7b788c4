//! Research CLI command: submit a query and stream the session events.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use crate::application::{ResearchOrchestrator, SessionOptions};
use crate::domain::models::SessionEvent;
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ResearchArgs {
    /// Natural-language research question
    pub query: String,

    /// Override the configured round budget
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Override the number of search queries planned per round
    #[arg(long)]
    pub fan_out: Option<usize>,

    /// Override the concurrent search call limit
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Load configuration from a specific file instead of .magellan/
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: ResearchArgs, json: bool) -> Result<()> {
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    let mut options = SessionOptions::from(&config);
    if let Some(max_rounds) = args.max_rounds {
        options.max_rounds = max_rounds;
    }
    if let Some(fan_out) = args.fan_out {
        options.fan_out = fan_out;
    }
    if let Some(concurrency) = args.concurrency {
        options.concurrency_limit = concurrency;
    }

    let orchestrator = ResearchOrchestrator::from_config(config)?;
    let mut handle = orchestrator.submit_research_with(&args.query, options);

    let mut failed = false;
    while let Some(event) = handle.events.recv().await {
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            render(&event);
        }
        if matches!(event, SessionEvent::Failed { .. }) {
            failed = true;
        }
    }

    if failed {
        bail!("research session failed");
    }
    Ok(())
}

fn render(event: &SessionEvent) {
    match event {
        SessionEvent::StatusChanged {
            status,
            round,
            gaps,
            finding_count,
            ..
        } => {
            if gaps.is_empty() {
                println!("[round {round}] {} ({finding_count} findings)", status.as_str());
            } else {
                println!(
                    "[round {round}] {} ({finding_count} findings; gaps: {})",
                    status.as_str(),
                    gaps.join("; ")
                );
            }
        }
        SessionEvent::Completed { report, .. } => {
            println!();
            if report.degraded {
                println!("-- degraded report --");
            }
            println!("{}", report.body);
            if !report.citations.is_empty() {
                println!("\nSources (first-use order):");
                for source in &report.citations {
                    println!("  - {source}");
                }
            }
        }
        SessionEvent::Failed { error, .. } => {
            println!("session failed: {}", error.message);
        }
    }
}
