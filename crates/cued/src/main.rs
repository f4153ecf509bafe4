//! cued - resolver daemon entry point.

use std::sync::Arc;

use anyhow::Result;
use cued::config::DaemonConfig;
use cued::remote::HttpRemoteClient;
use cued::server::{self, DaemonState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("cued v{} starting", env!("CARGO_PKG_VERSION"));

    let config = DaemonConfig::load();
    let remote = HttpRemoteClient::new(config.remote.clone())
        .map_err(|e| anyhow::anyhow!("remote client setup failed: {e}"))?;
    let state = DaemonState::new(config.matching.clone(), Arc::new(remote));

    let socket_path = cue_common::socket_path(None);
    let server = tokio::spawn(server::start_server(state, socket_path.clone()));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.abort();
    let _ = tokio::fs::remove_file(&socket_path).await;

    Ok(())
}
