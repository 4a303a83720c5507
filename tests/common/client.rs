//! Test chat client.
//!
//! A line-oriented TCP client that can send protocol lines and assert on
//! received lines, standing in for the GUI front-end.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A test chat client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl TestClient {
    /// Connect to a test server.
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        })
    }

    /// Send one protocol line.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive a single line from the server.
    pub async fn recv_line(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a line with a timeout. Errors on timeout or closed stream.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("connection closed by server");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Assert that no line arrives within `dur` and the stream stays open.
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        let mut line = String::new();
        match timeout(dur, self.reader.read_line(&mut line)).await {
            // Timed out with nothing received: actual silence.
            Err(_) => Ok(()),
            Ok(Ok(0)) => anyhow::bail!("expected silence, but the server closed the stream"),
            Ok(Ok(_)) => anyhow::bail!("expected silence, got: {}", line.trim_end()),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    /// True once the server has closed the stream.
    pub async fn is_closed(&mut self, dur: Duration) -> bool {
        let mut line = String::new();
        matches!(
            timeout(dur, self.reader.read_line(&mut line)).await,
            Ok(Ok(0))
        )
    }

    /// Receive lines until the given predicate returns true.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut lines = Vec::new();
        loop {
            let line = self.recv_line().await?;
            let done = predicate(&line);
            lines.push(line);
            if done {
                break;
            }
        }
        Ok(lines)
    }

    /// Register with the server and wait for the roster refresh that
    /// confirms it (success is otherwise silent).
    pub async fn register(&mut self, nick: &str) -> anyhow::Result<()> {
        self.send_line(nick).await?;
        let lines = self
            .recv_until(|line| line.starts_with("Active Users: "))
            .await?;
        if lines.iter().any(|l| l.starts_with("Active Users: ")) {
            Ok(())
        } else {
            anyhow::bail!("Registration failed: no roster broadcast received")
        }
    }
}
