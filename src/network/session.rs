//! Session - handles an individual client connection.
//!
//! Each Session runs in its own Tokio task:
//!
//! Phase 1: Handshake - the first line read is the candidate nickname and
//! is claimed atomically in the Registry. A conflict gets one rejection
//! line and the connection closes without ever entering the active state.
//!
//! Phase 2: Active - a writer task drains the session's outbound queue
//! into the socket while the read loop hands every inbound line to the
//! router. Either side failing, EOF, or the terminate keyword ends the
//! session.
//!
//! Cleanup (unregister + roster broadcast) runs on every exit path out of
//! the active state. A leaked registry entry would make the nickname
//! permanently unusable and leave broadcasts pointed at a dead sink.

use crate::error::SessionError;
use crate::router::{self, Disposition};
use crate::state::Registry;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, info, instrument};

/// Upper bound on one protocol line; a peer exceeding it is disconnected.
const MAX_LINE_LEN: usize = 1024;

/// Depth of the per-session outbound queue. A peer this far behind stalls
/// anyone delivering to it until its writer catches up.
const OUTBOUND_QUEUE_DEPTH: usize = 32;

/// Sent to a client whose claimed nickname is already registered.
const REJECTION_LINE: &str = "Nickname already in use. Disconnecting...";

/// A client session handler.
pub struct Session {
    stream: TcpStream,
    addr: SocketAddr,
    registry: Arc<Registry>,
}

impl Session {
    /// Create a new session handler for an accepted connection.
    pub fn new(stream: TcpStream, addr: SocketAddr, registry: Arc<Registry>) -> Self {
        Self {
            stream,
            addr,
            registry,
        }
    }

    /// Run the session from handshake to termination.
    #[instrument(skip(self), fields(addr = %self.addr), name = "session")]
    pub async fn run(self) -> Result<(), SessionError> {
        let registry = self.registry;
        let (read_half, write_half) = self.stream.into_split();
        let mut reader = FramedRead::new(read_half, LinesCodec::new_with_max_length(MAX_LINE_LEN));
        let mut writer =
            FramedWrite::new(write_half, LinesCodec::new_with_max_length(MAX_LINE_LEN));

        // Phase 1: the first line names the session.
        let nickname = match reader.next().await {
            Some(line) => line?,
            None => {
                debug!("peer closed before sending a nickname");
                return Ok(());
            }
        };
        if nickname.is_empty() {
            debug!("empty nickname, dropping connection");
            return Ok(());
        }

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_DEPTH);
        if !registry.try_register(&nickname, outbound_tx) {
            info!(nick = %nickname, "nickname conflict");
            writer.send(REJECTION_LINE).await?;
            return Err(SessionError::NicknameInUse(nickname));
        }
        info!(nick = %nickname, "registered");

        // Writer task: drains the outbound queue into the socket. It runs
        // until every sink clone is gone, which the unregister below
        // guarantees. A write failure only stops delivery to this peer; the
        // read side notices the dead connection on its own.
        let writer_task = tokio::spawn(async move {
            while let Some(line) = outbound_rx.recv().await {
                if let Err(e) = writer.send(line).await {
                    debug!(error = %e, "write failed, discarding remaining outbound lines");
                    break;
                }
            }
        });

        // Membership changed: everyone, including this session, gets the
        // new roster.
        router::broadcast_roster(&registry).await;

        let result = Self::read_loop(&registry, &nickname, &mut reader).await;

        // Phase 3: unconditional cleanup.
        registry.unregister(&nickname);
        router::broadcast_roster(&registry).await;
        let _ = writer_task.await;
        info!(nick = %nickname, remaining = registry.len(), "session closed");

        result
    }

    /// Read lines from the peer until it disconnects or asks to leave.
    async fn read_loop(
        registry: &Registry,
        nickname: &str,
        reader: &mut FramedRead<OwnedReadHalf, LinesCodec>,
    ) -> Result<(), SessionError> {
        while let Some(line) = reader.next().await {
            let line = line?;
            debug!(nick = %nickname, raw = %line, "received line");
            if router::route(registry, nickname, &line).await == Disposition::Terminate {
                info!(nick = %nickname, "client requested disconnect");
                return Ok(());
            }
        }
        debug!(nick = %nickname, "peer closed stream");
        Ok(())
    }
}
