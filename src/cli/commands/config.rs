//! Config CLI command: print the merged configuration.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Load configuration from a specific file instead of .magellan/
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: ConfigArgs, json: bool) -> Result<()> {
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    if json {
        println!("{}", serde_json::to_string(&config)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }
    Ok(())
}
