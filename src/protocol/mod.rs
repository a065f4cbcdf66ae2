//! # Protocol Behaviour
//!
//! Time-driven parts of the protocol layered over the framing core.
//!
//! ## Components
//! - **Heartbeat**: periodic zero-length frames that keep idle links alive

pub(crate) mod heartbeat;
