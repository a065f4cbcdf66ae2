//! # Transport Layer
//!
//! The byte streams a [`Connection`](crate::service::connection::Connection) can
//! own, and the best-effort socket tuning applied when one is created.
//!
//! ## Implementations
//! - **TCP**: `tokio::net::TcpStream`, tuned through `socket2`
//! - **Local**: `tokio::net::UnixStream` (Unix only)
//! - **Memory**: `tokio::io::DuplexStream`, no tuning
//!
//! Closing a transport is dropping it: the connection's reader and writer tasks
//! each own one half and let go of it on teardown.

use std::io;

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tracing::{debug, warn};

use crate::config::SocketConfig;
use crate::service::connection::ConnectionId;

#[cfg(unix)]
pub mod local;
pub mod tcp;

/// A duplex byte stream a connection can run on.
///
/// The tuning hooks default to `Unsupported`; streams that are real sockets
/// override the ones their platform supports.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    /// Disable Nagle-style coalescing
    fn set_nodelay(&self, _nodelay: bool) -> io::Result<()> {
        Err(unsupported("TCP_NODELAY"))
    }

    /// Request a kernel send buffer of `size` bytes
    fn set_send_buffer_size(&self, _size: usize) -> io::Result<()> {
        Err(unsupported("SO_SNDBUF"))
    }

    /// Request a kernel receive buffer of `size` bytes
    fn set_recv_buffer_size(&self, _size: usize) -> io::Result<()> {
        Err(unsupported("SO_RCVBUF"))
    }

    /// Human-readable peer description for logs
    fn describe(&self) -> String {
        String::from("unknown")
    }
}

impl Transport for DuplexStream {
    fn describe(&self) -> String {
        String::from("memory")
    }
}

fn unsupported(option: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{option} is not supported by this transport"),
    )
}

/// Apply the requested socket options, logging and ignoring any the transport rejects.
pub(crate) fn apply_socket_options<T: Transport>(
    transport: &T,
    options: &SocketConfig,
    conn_id: ConnectionId,
) {
    if options.nodelay {
        report(conn_id, "no delay", transport.set_nodelay(true));
    }
    if options.send_buffer_size > 0 {
        report(
            conn_id,
            "send buffer size",
            transport.set_send_buffer_size(options.send_buffer_size),
        );
    }
    if options.recv_buffer_size > 0 {
        report(
            conn_id,
            "receive buffer size",
            transport.set_recv_buffer_size(options.recv_buffer_size),
        );
    }
}

fn report(conn_id: ConnectionId, option: &'static str, result: io::Result<()>) {
    match result {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::Unsupported => {
            debug!(conn_id = %conn_id, option, error = %e, "Socket option not applicable");
        }
        Err(e) => {
            warn!(conn_id = %conn_id, option, error = %e, "Error setting socket option");
        }
    }
}
