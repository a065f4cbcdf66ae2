//! # network-connection
//!
//! A persistent, duplex connection over any async byte stream, speaking a
//! length-prefixed framing protocol with periodic heartbeats.
//!
//! ## Architecture
//! ```text
//! send_packet ─┐
//! heartbeat  ──┼─► mpsc queue ─► writer task ─► Transport (write half)
//!              │
//! Transport (read half) ─► FramedRead<FrameCodec> ─► ConnectionListener
//! ```
//!
//! - One reader task decodes frames and pushes payloads to the listener.
//! - One writer task drains the outbound queue, so at most one write is in flight
//!   and frames leave in the order they were queued.
//! - A heartbeat task queues an empty frame every `heartbeat_interval`.
//! - The first terminal condition (I/O failure, end of stream, oversized frame)
//!   is reported once through [`ConnectionListener::on_disconnected`]; anything
//!   after it, including a local [`Connection::close`], is silent.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use network_connection::{
//!     Connection, ConnectionConfig, ConnectionListener, DisconnectReason,
//! };
//!
//! struct Printer;
//!
//! impl ConnectionListener for Printer {
//!     fn on_packet_received(&self, connection: &Arc<Connection>, payload: Bytes) {
//!         println!("{}: {} bytes", connection.id(), payload.len());
//!     }
//!
//!     fn on_disconnected(&self, connection: &Arc<Connection>, reason: &DisconnectReason) {
//!         println!("{} gone: {reason}", connection.id());
//!     }
//! }
//!
//! # async fn run() -> network_connection::error::Result<()> {
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:9000").await?;
//! let conn = Connection::create(Arc::new(Printer), stream, ConnectionConfig::default());
//! conn.start()?;
//! conn.send_packet(&b"ping"[..])?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::config::{ConnectionConfig, NetworkConfig, SocketConfig};
pub use crate::core::codec::FrameCodec;
pub use crate::core::frame::{Frame, HEADER_SIZE, MAX_MESSAGE_SIZE};
pub use crate::error::{ConnectionError, DisconnectReason};
pub use crate::service::connection::{Connection, ConnectionId};
pub use crate::service::listener::ConnectionListener;
pub use crate::transport::Transport;
