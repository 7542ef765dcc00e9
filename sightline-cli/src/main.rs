//! Sightline CLI
//!
//! Lists the available analysis pipelines and runs worker tasks locally.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use sightline_worker::config::DEFAULT_STORAGE_URL;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sightline")]
#[command(about = "Sightline pipeline discovery and media task CLI", long_about = None)]
struct Cli {
    /// Storage API URL
    #[arg(long, env = "SIGHTLINE_STORAGE_URL", default_value = DEFAULT_STORAGE_URL)]
    storage_url: String,

    /// Storage authentication token
    #[arg(long, env = "SIGHTLINE_STORAGE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Append tool output to this file instead of the console
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sightline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.storage_url, cli.token, cli.log_file)?;

    handle_command(cli.command, &config).await
}
