//! Distill CLI
//!
//! Condenses long videos into highlight reels.
//!
//! # Usage
//!
//! ```bash
//! distiller summarize -i talk.mp4 --plan plan.json --format json
//! distiller summarize -i talk.mp4 -o highlights.mp4 --fraction 0.1
//! distiller scenes -i talk.mp4 --fine --export-dir scenes/
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use distill_cli::adapters::TomlConfigAdapter;
use distill_cli::app::container::DefaultAppContainer;
use distill_cli::cli::{commands, Cli, Commands};
use distill_cli::config_initialization::initialize_configuration_hierarchy;
use distill_cli::utils::logging::{LoggingConfig, LoggingSystem};

/// Main entry point for the Distill CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = initialize_configuration_hierarchy(&cli, &TomlConfigAdapter::new())?;
    let config = loaded.config;

    let logging = LoggingSystem::new(LoggingConfig::new(config.logging.level, config.logging.format));
    logging
        .initialize()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    logging.log_system_info();

    match &loaded.source {
        Some(path) => info!(path = %path.display(), "Using configuration file"),
        None => info!("Using default configuration"),
    }
    info!(
        env_overrides = loaded.env_overrides,
        cli_overrides = loaded.cli_overrides,
        "Configuration resolved"
    );

    distill_cli::init()?;
    let overwrite = config.pipeline.overwrite;
    let container = DefaultAppContainer::new(config).context("Failed to initialize adapters")?;

    match cli.command {
        Commands::Summarize(args) => {
            info!("Executing summarize command");
            commands::summarize(&container, args, overwrite).await?;
        }
        Commands::Scenes(args) => {
            info!("Executing scenes command");
            commands::scenes(&container, args, overwrite).await?;
        }
    }

    info!("Distill completed successfully");
    Ok(())
}
