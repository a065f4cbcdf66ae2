//! # Core Framing Components
//!
//! Low-level frame handling for the connection: the wire unit and the Tokio
//! codec that turns a byte stream into frames and back.
//!
//! ## Components
//! - **Frame**: a heartbeat or an opaque message payload
//! - **Codec**: Tokio codec driving the header/payload state machine
//!
//! ## Wire Format
//! ```text
//! [Length(4, u32 little-endian)] [Payload(Length)]
//! ```
//! A length of zero is a heartbeat and carries no payload.
//!
//! ## Security
//! - Declared lengths are checked against the configured maximum before any
//!   payload byte is buffered
//! - Default maximum message size: 64 MiB

pub mod codec;
pub mod frame;
