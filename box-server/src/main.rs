//! dots-server binary entry point.
//!
//! Usage:
//! ```bash
//! dots-server --config server.toml
//! dots-server --bind 127.0.0.1:3001 --grid-size 4
//! dots-server --help
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use dotsboxes_server::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Session coordinator for dots-and-boxes.
#[derive(Parser, Debug)]
#[command(name = "dots-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file (missing file means defaults)
    #[arg(long, short, default_value = "server.toml")]
    config: PathBuf,

    /// Override `server.bind_address`
    #[arg(long)]
    bind: Option<String>,

    /// Override `game.grid_size`
    #[arg(long)]
    grid_size: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load_or_default(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(grid_size) = args.grid_size {
        config.game.grid_size = grid_size;
    }

    tracing::info!("dots-server v{}", env!("CARGO_PKG_VERSION"));
    dotsboxes_server::run(config, shutdown_signal())
        .await
        .context("Server failed")?;
    tracing::info!("dots-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
