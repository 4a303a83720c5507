//! charlad - a tiny line-oriented multi-user chat relay daemon.
//!
//! Clients connect over TCP, claim a nickname with their first line, then
//! exchange roster broadcasts and private messages as newline-delimited
//! text.

mod config;
mod error;
mod network;
mod router;
mod state;

use crate::config::Config;
use crate::network::Gateway;
use crate::state::Registry;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // An explicit config path must load; the default path may be absent.
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).map_err(|e| {
            error!(path = %path, error = %e, "Failed to load config");
            e
        })?,
        None => Config::load_or_default("charlad.toml")?,
    };

    info!(
        server = %config.server.name,
        address = %config.listen.address,
        "Starting charlad"
    );

    let registry = Arc::new(Registry::new());
    let gateway = Gateway::bind(config.listen.address, registry).await?;
    gateway.run().await
}
