//! # Marabu Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Install the tracing subscriber (`RUST_LOG`, default `info`)
//! 2. Load configuration (defaults, then `MB_*` environment variables)
//! 3. Open storage under the data directory
//! 4. Restore genesis, the best tip and the mempool
//! 5. Mine on the configured interval until Ctrl+C

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::adapters::open_store;
use node_runtime::{NoPeers, NodeConfig, NodeContainer};

/// Load configuration from the environment.
fn load_config() -> Result<NodeConfig> {
    let config = NodeConfig::from_env();
    config.validate().context("Invalid configuration")?;
    info!("Data Dir: {:?}", config.storage.data_dir);
    info!(
        "Mining: enabled={}, workers={}, interval={:?}, activation height={}",
        config.mining.enabled,
        config.mining.workers,
        config.mining.interval,
        config.mining.activation_height
    );
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  Marabu Node Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let config = load_config()?;
    let kv = open_store(&config.storage).context("Failed to open storage")?;
    let container = NodeContainer::new(kv, &config, Arc::new(NoPeers))
        .context("Failed to initialize node")?;

    info!("Node is running. Press Ctrl+C to stop.");
    container
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await;

    info!("Shutdown complete");
    Ok(())
}
