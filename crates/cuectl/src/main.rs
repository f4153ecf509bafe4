//! cuectl - CLI client for the cue answer daemon.

mod cli;
mod client;
mod commands;
mod observer;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let socket_path = cue_common::socket_path(cli.socket.as_deref());

    match cli.command {
        Commands::Upload { file } => commands::upload(&socket_path, &file).await,
        Commands::Trigger { command } => commands::trigger(&socket_path, &command).await,
        Commands::Observe => commands::observe(&socket_path).await,
        Commands::Ping => commands::ping(&socket_path).await,
    }
}
