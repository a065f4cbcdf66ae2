//! # TCP Transport
//!
//! `Transport` for `tokio::net::TcpStream` plus helpers that turn a freshly
//! connected or accepted stream into a [`Connection`].
//!
//! Buffer sizes go through `socket2::SockRef` since tokio only exposes them on
//! an unconnected `TcpSocket`.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use socket2::SockRef;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{info, instrument};

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::service::connection::Connection;
use crate::service::listener::ConnectionListener;
use crate::transport::Transport;

impl Transport for TcpStream {
    fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        TcpStream::set_nodelay(self, nodelay)
    }

    fn set_send_buffer_size(&self, size: usize) -> io::Result<()> {
        SockRef::from(self).set_send_buffer_size(size)
    }

    fn set_recv_buffer_size(&self, size: usize) -> io::Result<()> {
        SockRef::from(self).set_recv_buffer_size(size)
    }

    fn describe(&self) -> String {
        self.peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| String::from("tcp"))
    }
}

/// Connect to `addr` and wrap the stream in an unstarted connection
#[instrument(skip(addr, listener, config))]
pub async fn connect<A: ToSocketAddrs>(
    addr: A,
    listener: Arc<dyn ConnectionListener>,
    config: ConnectionConfig,
) -> Result<Arc<Connection>> {
    let stream = TcpStream::connect(addr).await?;
    info!(peer = %stream.describe(), "Outbound connection established");
    Ok(Connection::create(listener, stream, config))
}

/// Accept one inbound stream and wrap it in an unstarted connection
#[instrument(skip_all)]
pub async fn accept(
    tcp_listener: &TcpListener,
    listener: Arc<dyn ConnectionListener>,
    config: ConnectionConfig,
) -> Result<(Arc<Connection>, SocketAddr)> {
    let (stream, addr) = tcp_listener.accept().await?;
    info!(peer = %addr, "Inbound connection accepted");
    Ok((Connection::create(listener, stream, config), addr))
}
