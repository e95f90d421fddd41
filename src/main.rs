//! country-relay - fetch country data, archive it, relay it
//!
//! # Usage
//!
//! ```bash
//! # Run with built-in defaults
//! country-relay
//!
//! # Run with a config file
//! country-relay -c relay.yaml
//!
//! # Validate a config file
//! country-relay -c relay.yaml validate
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use country_relay::{PipelineRunner, RelayConfig};

#[derive(Parser)]
#[command(name = "country-relay")]
#[command(
    version,
    about = "Fetch country reference data, archive it to CSV, and relay it to a REST endpoint"
)]
struct Cli {
    /// Path to configuration file (defaults apply without one)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline (default)
    Run,
    /// Validate the configuration file and exit
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => RelayConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RelayConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Validate => {
            // from_file already validated; defaults are always valid
            info!("configuration is valid");
            Ok(())
        }
        Commands::Run => {
            let runner = PipelineRunner::from_config(&config)?;
            runner.run().await?;
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
