//! # Configuration Management
//!
//! Centralized configuration for connections and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Environment variables via `from_env()`
//! - Direct instantiation with defaults and `default_with_overrides()`
//!
//! ## Defaults
//! - Heartbeat every 10 seconds
//! - Maximum message size 64 MiB
//! - TCP_NODELAY on, 4 MiB socket send/receive buffers

use crate::core::frame::MAX_MESSAGE_SIZE;
use crate::error::{ConnectionError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Period between two outbound heartbeat frames
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Requested socket send/receive buffer size (4 MiB)
pub const SOCKET_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NetworkConfig {
    /// Per-connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NetworkConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ConnectionError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ConnectionError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ConnectionError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(heartbeat) = std::env::var("NETWORK_CONNECTION_HEARTBEAT_INTERVAL_MS") {
            let val = heartbeat.parse::<u64>().map_err(|e| {
                ConnectionError::ConfigError(format!("Invalid heartbeat interval '{heartbeat}': {e}"))
            })?;
            config.connection.heartbeat_interval = Duration::from_millis(val);
        }

        if let Ok(size) = std::env::var("NETWORK_CONNECTION_MAX_MESSAGE_SIZE") {
            let val = size.parse::<usize>().map_err(|e| {
                ConnectionError::ConfigError(format!("Invalid max message size '{size}': {e}"))
            })?;
            config.connection.max_message_size = val;
        }

        if let Ok(nodelay) = std::env::var("NETWORK_CONNECTION_NODELAY") {
            config.connection.socket.nodelay = matches!(nodelay.as_str(), "1" | "true" | "yes");
        }

        if let Ok(level) = std::env::var("NETWORK_CONNECTION_LOG_LEVEL") {
            config.logging.log_level = level
                .parse::<Level>()
                .map_err(|_| ConnectionError::ConfigError(format!("Invalid log level: {level}")))?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConnectionError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ConnectionError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.connection.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConnectionError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Per-connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Interval between outbound heartbeat frames
    #[serde(with = "duration_serde")]
    pub heartbeat_interval: Duration,

    /// Largest payload accepted on receive and allowed on send
    pub max_message_size: usize,

    /// Best-effort socket tuning applied at creation
    pub socket: SocketConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: HEARTBEAT_INTERVAL,
            max_message_size: MAX_MESSAGE_SIZE,
            socket: SocketConfig::default(),
        }
    }
}

impl ConnectionConfig {
    /// Validate connection configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.heartbeat_interval.as_millis() < 100 {
            errors.push("Heartbeat interval too short (minimum: 100ms)".to_string());
        } else if self.heartbeat_interval.as_secs() > 3600 {
            errors.push("Heartbeat interval too long (maximum: 1 hour)".to_string());
        }

        if self.max_message_size == 0 {
            errors.push("Max message size cannot be 0".to_string());
        } else if self.max_message_size as u64 > u32::MAX as u64 {
            errors.push(format!(
                "Max message size too large: {} bytes (the 4-byte length prefix allows at most {})",
                self.max_message_size,
                u32::MAX
            ));
        }

        errors.extend(self.socket.validate());
        errors
    }
}

/// Socket options requested when a connection is created.
///
/// Every option is best-effort: platforms that reject one get a log line, not an
/// error.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SocketConfig {
    /// Disable Nagle's algorithm
    pub nodelay: bool,

    /// Requested kernel send buffer size in bytes (0 leaves the OS default)
    pub send_buffer_size: usize,

    /// Requested kernel receive buffer size in bytes (0 leaves the OS default)
    pub recv_buffer_size: usize,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            nodelay: true,
            send_buffer_size: SOCKET_BUFFER_SIZE,
            recv_buffer_size: SOCKET_BUFFER_SIZE,
        }
    }
}

impl SocketConfig {
    /// Validate socket configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, size) in [
            ("Send buffer size", self.send_buffer_size),
            ("Receive buffer size", self.recv_buffer_size),
        ] {
            if size > 256 * 1024 * 1024 {
                errors.push(format!(
                    "{name} too large: {size} bytes (maximum recommended: 256 MB)"
                ));
            }
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("network-connection"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
