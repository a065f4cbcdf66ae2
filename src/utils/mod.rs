//! # Utility Modules
//!
//! Supporting utilities used throughout the connection implementation.
//!
//! ## Components
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe traffic and lifecycle counters

pub mod logging;
pub mod metrics;

pub use metrics::{global_metrics, ConnectionStats, ConnectionStatsSnapshot};
