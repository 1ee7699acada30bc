//! devhub - per-user dev container workspaces on a Docker host
//!
//! This is the interactive CLI entry point.

use anyhow::Context;
use clap::Parser;
use devhub::cli::Repl;
use devhub::config::{Settings, DEFAULT_CONFIG_FILE};
use devhub::container::DockerEngine;
use devhub::workspace::WorkspaceManager;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// devhub - provision dev container workspaces behind a reverse proxy
#[derive(Parser)]
#[command(name = "devhub")]
#[command(version)]
#[command(about = "Interactive provisioning of per-user dev container workspaces", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout belongs to the REPL
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    info!(
        "Using image {} on network {} for *.{}",
        settings.image, settings.network, settings.base_domain
    );

    let engine = DockerEngine::connect().context("Failed to connect to the Docker engine")?;
    let repl = Repl::new(WorkspaceManager::new(engine, &settings));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    repl.run(stdin, &mut stdout).await?;

    Ok(())
}
