//! Magellan CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use magellan::cli::{Cli, Commands};
use magellan::domain::models::LoggingConfig;
use magellan::infrastructure::config::ConfigLoader;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));

    if logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    // Logging setup tolerates a broken config file; commands report the
    // load failure themselves with proper context.
    let logging = ConfigLoader::load()
        .map(|config| config.logging)
        .unwrap_or_default();
    init_tracing(&logging);

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Research(args) => magellan::cli::commands::research::execute(args, cli.json).await,
        Commands::Config(args) => magellan::cli::commands::config::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        magellan::cli::handle_error(err, cli.json);
    }
}
