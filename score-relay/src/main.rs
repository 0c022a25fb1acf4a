//! scorecast-relay binary entry point.
//!
//! Usage:
//! ```bash
//! scorecast-relay --config relay.toml
//! scorecast-relay --bind 127.0.0.1:8000 --snapshot ./save
//! scorecast-relay --help
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use score_core::ContestReducer;
use scorecast_relay::persistence::FileSnapshotStore;
use scorecast_relay::{http, Config, SyncRelay};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Live-state relay server for scorecast.
#[derive(Parser, Debug)]
#[command(name = "scorecast-relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults are used if it does not exist)
    #[arg(long, default_value = "relay.toml")]
    config: PathBuf,

    /// Override the listen address, e.g. 0.0.0.0:8000
    #[arg(long)]
    bind: Option<String>,

    /// Override the snapshot file path
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let mut config = if cli.config.exists() {
        Config::from_file(&cli.config)?
    } else {
        tracing::warn!(
            "Config file {} not found, using defaults",
            cli.config.display()
        );
        Config::default()
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(snapshot) = cli.snapshot {
        config.storage.snapshot_path = snapshot;
    }

    let persistence = Arc::new(FileSnapshotStore::new(&config.storage.snapshot_path));
    let bind_address = config.server.bind_address.clone();
    let relay = SyncRelay::bootstrap(config, Arc::new(ContestReducer::new()), persistence)
        .await
        .context("Failed to load snapshot")?;

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!(
        "scorecast-relay v{} listening on {} (ws path {})",
        env!("CARGO_PKG_VERSION"),
        listener.local_addr()?,
        relay.config().server.ws_path
    );

    http::serve(listener, Arc::new(relay), shutdown_signal()).await?;
    tracing::info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
    }
}
