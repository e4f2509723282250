//! Command-line interface.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::batch::BatchArgs;
use commands::preview::PreviewArgs;

#[derive(Parser, Debug)]
#[command(name = "glimpse")]
#[command(about = "Glimpse - preview generated output before committing to it", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .glimpse/
    #[arg(short, long, global = true, env = "GLIMPSE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Preview one draft, optionally committing the result
    Preview(PreviewArgs),

    /// Run a JSON file of drafts through the optimizer
    Batch(BatchArgs),

    /// Show the effective configuration
    Config,
}

/// Report a command failure and exit with status 1.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| err.to_string())
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
