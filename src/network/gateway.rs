//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the listening socket and spawns one Session task per
//! accepted client. Accept errors are transient; only the initial bind can
//! take the server down.

use crate::network::Session;
use crate::state::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};

/// The Gateway accepts incoming TCP connections and spawns session handlers.
pub struct Gateway {
    listener: TcpListener,
    registry: Arc<Registry>,
}

impl Gateway {
    /// Bind the gateway to the specified address. Bind failure is fatal.
    pub async fn bind(addr: SocketAddr, registry: Arc<Registry>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "Listener bound");
        Ok(Self { listener, registry })
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!(%addr, "Connection accepted");
                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(async move {
                        let session = Session::new(stream, addr, registry);
                        match session.run().await {
                            Ok(()) => info!(%addr, "Connection closed"),
                            Err(e) => {
                                warn!(%addr, code = e.error_code(), error = %e, "Connection closed")
                            }
                        }
                    });
                }
                Err(e) => {
                    // One failed accept must not take the loop down.
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
