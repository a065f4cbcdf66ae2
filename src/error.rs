//! # Error Types
//!
//! Error handling for the connection layer.
//!
//! Two families of errors live here:
//! - [`ConnectionError`]: returned from fallible API calls (`start`, `send_packet`,
//!   configuration loading) and produced by the frame codec.
//! - [`DisconnectReason`]: the terminal condition handed to
//!   [`ConnectionListener::on_disconnected`](crate::service::listener::ConnectionListener::on_disconnected).
//!
//! ## Error Categories
//! - **I/O Errors**: reads, writes, resets and end of stream on the transport
//! - **Protocol Errors**: declared frame lengths above the configured maximum
//! - **Lifecycle Errors**: sending after teardown, starting twice
//! - **Configuration Errors**: unreadable or invalid configuration
//!
//! ## Example Usage
//! ```rust
//! use network_connection::error::{ConnectionError, Result};
//!
//! fn check_size(len: usize, max: usize) -> Result<()> {
//!     if len > max {
//!         return Err(ConnectionError::OversizedFrame { size: len, max });
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_size(10, 16).is_ok());
//! assert!(check_size(17, 16).is_err());
//! ```

use std::io;
use thiserror::Error;

// ConnectionError is the primary error type for all connection operations
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Frame too large: {size} bytes (maximum {max})")]
    OversizedFrame { size: usize, max: usize },

    #[error("Connection already started")]
    AlreadyStarted,

    #[error("No async runtime available: {0}")]
    NoRuntime(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Synchronization primitive poisoned")]
    LockPoisoned,
}

/// Type alias for Results using ConnectionError
pub type Result<T> = std::result::Result<T, ConnectionError>;

/// Why a connection stopped.
///
/// Delivered exactly once per connection to the listener. A protocol violation
/// ([`DisconnectReason::InvalidSize`]) is kept apart from raw transport failures so
/// callers can tell a misbehaving peer from a broken network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The transport failed while reading or writing.
    #[error("{message}")]
    Transport { kind: io::ErrorKind, message: String },

    /// The peer closed the stream cleanly between two frames.
    #[error("Connection closed by peer")]
    EndOfStream,

    /// The peer declared a frame longer than the configured maximum.
    #[error("Invalid packet size: {declared} bytes (maximum {max})")]
    InvalidSize { declared: usize, max: usize },
}

impl DisconnectReason {
    /// Whether the peer broke the framing rules, as opposed to the transport failing.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::InvalidSize { .. })
    }
}

impl From<io::Error> for DisconnectReason {
    fn from(err: io::Error) -> Self {
        Self::Transport {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<ConnectionError> for DisconnectReason {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Io(e) => e.into(),
            ConnectionError::OversizedFrame { size, max } => Self::InvalidSize {
                declared: size,
                max,
            },
            other => Self::Transport {
                kind: io::ErrorKind::Other,
                message: other.to_string(),
            },
        }
    }
}
