//! Test server management.
//!
//! Spawns and manages charlad instances for integration testing.

use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use tokio::time::sleep;

/// A test server instance.
pub struct TestServer {
    child: Child,
    port: u16,
    data_dir: PathBuf,
}

impl TestServer {
    /// Spawn a new test server listening on the given port.
    pub async fn spawn(port: u16) -> anyhow::Result<Self> {
        // Create temporary directory for the generated config
        let data_dir = std::env::temp_dir().join(format!("charlad-test-{}", port));
        std::fs::create_dir_all(&data_dir)?;

        let config_path = data_dir.join("charlad.toml");
        let config_content = format!(
            r#"
[server]
name = "test.charlad"

[listen]
address = "127.0.0.1:{}"
"#,
            port
        );
        std::fs::write(&config_path, config_content)?;

        // Build path to the charlad binary (in the crate's target dir)
        let cargo_manifest_dir = env!("CARGO_MANIFEST_DIR");
        let binary_path = PathBuf::from(cargo_manifest_dir).join("target/debug/charlad");

        let child = Command::new(&binary_path)
            .arg(config_path.to_str().unwrap())
            .spawn()?;

        let server = Self {
            child,
            port,
            data_dir,
        };

        // Wait for the server to start listening
        server.wait_until_ready().await?;

        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..30 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 3 seconds")
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Create a new test client connected to this server.
    #[allow(dead_code)]
    pub async fn connect(&self) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address()).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}
