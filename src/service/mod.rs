//! # Connection Service
//!
//! The connection object, its write path, and the listener trait callers
//! implement to receive payloads and disconnect notifications.

pub mod connection;
pub mod listener;
pub(crate) mod writer;
