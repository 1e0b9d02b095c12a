//! devlink - live link to an embedded device's web interface.
//!
//! Main entry point for the devlink CLI.

mod cli;
mod console;
mod runner;

use clap::Parser;
use tracing::warn;

use devlink_config::{ConfigLoader, ConfigValidator};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(&cli.config)?;
    if let Some(url) = cli.url {
        config.device.location = url;
    }
    let warnings = ConfigValidator::validate(&config).into_result()?;

    runner::init_tracing(&config.logging)?;
    for warning in warnings {
        warn!("{}: {}", warning.path, warning.message);
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => runner::run(config).await,
        Commands::Endpoints => runner::print_endpoints(&config),
    }
}
