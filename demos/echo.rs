//! TCP echo server.
//!
//! Every message received is sent straight back on the same connection.
//!
//! ```text
//! cargo run --example echo -- 127.0.0.1:7000
//! ```

use std::sync::Arc;

use bytes::Bytes;
use network_connection::config::NetworkConfig;
use network_connection::transport::tcp;
use network_connection::utils::{global_metrics, logging::init_logging};
use network_connection::{Connection, ConnectionListener, DisconnectReason};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

struct Echo;

impl ConnectionListener for Echo {
    fn on_packet_received(&self, connection: &Arc<Connection>, payload: Bytes) {
        if let Err(e) = connection.send_packet(payload) {
            warn!(id = %connection.id(), error = %e, "Echo failed");
        }
    }

    fn on_disconnected(&self, connection: &Arc<Connection>, reason: &DisconnectReason) {
        info!(id = %connection.id(), peer = connection.peer(), %reason, "Client gone");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = NetworkConfig::from_env()?;
    config.validate_strict()?;
    init_logging(&config.logging)?;

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("127.0.0.1:7000"));
    let server = TcpListener::bind(&addr).await?;
    info!(%addr, "Echo server listening");

    let listener: Arc<dyn ConnectionListener> = Arc::new(Echo);
    loop {
        tokio::select! {
            accepted = tcp::accept(&server, listener.clone(), config.connection.clone()) => {
                match accepted {
                    Ok((conn, _)) => {
                        if let Err(e) = conn.start() {
                            error!(error = %e, "Failed to start connection");
                        }
                    }
                    Err(e) => warn!(error = %e, "Accept failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    global_metrics().log_metrics();
    Ok(())
}
