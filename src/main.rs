//! Glimpse CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use glimpse::cli::{commands, handle_error, Cli, Commands};
use glimpse::infrastructure::logging::{LogConfig, LoggerImpl};
use glimpse::{Config, ConfigLoader};

fn load_config(cli: &Cli) -> Result<Config> {
    match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let log_config =
        LogConfig::try_from(&config.logging).context("Invalid logging configuration")?;
    let _logger = LoggerImpl::init(&log_config)?;

    match cli.command {
        Commands::Preview(args) => commands::preview::execute(args, &config, cli.json).await,
        Commands::Batch(args) => commands::batch::execute(args, &config, cli.json).await,
        Commands::Config => commands::config::execute(&config, cli.json),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}
