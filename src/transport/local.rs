//! # Local Transport
//!
//! Unix domain sockets for same-host peers. There is no Nagle on a local
//! socket, so only the buffer sizes are applied; the no-delay request is
//! reported as unsupported and skipped.

use std::io;
use std::path::Path;
use std::sync::Arc;

use socket2::SockRef;
use tokio::net::{UnixListener, UnixStream};
use tracing::{info, instrument};

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::service::connection::Connection;
use crate::service::listener::ConnectionListener;
use crate::transport::Transport;

impl Transport for UnixStream {
    fn set_send_buffer_size(&self, size: usize) -> io::Result<()> {
        SockRef::from(self).set_send_buffer_size(size)
    }

    fn set_recv_buffer_size(&self, size: usize) -> io::Result<()> {
        SockRef::from(self).set_recv_buffer_size(size)
    }

    fn describe(&self) -> String {
        self.peer_addr()
            .ok()
            .and_then(|addr| addr.as_pathname().map(|p| p.display().to_string()))
            .unwrap_or_else(|| String::from("unix"))
    }
}

/// Connect to a local IPC socket and wrap it in an unstarted connection
#[instrument(skip(path, listener, config), fields(socket_path = %path.as_ref().display()))]
pub async fn connect<P: AsRef<Path>>(
    path: P,
    listener: Arc<dyn ConnectionListener>,
    config: ConnectionConfig,
) -> Result<Arc<Connection>> {
    let stream = UnixStream::connect(path).await?;
    info!("Local connection established");
    Ok(Connection::create(listener, stream, config))
}

/// Accept one local peer and wrap it in an unstarted connection
#[instrument(skip_all)]
pub async fn accept(
    unix_listener: &UnixListener,
    listener: Arc<dyn ConnectionListener>,
    config: ConnectionConfig,
) -> Result<Arc<Connection>> {
    let (stream, _) = unix_listener.accept().await?;
    info!("Local connection accepted");
    Ok(Connection::create(listener, stream, config))
}
