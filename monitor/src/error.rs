//! Error handling for the performance monitor
//!
//! Only configuration, export and scheduling paths can fail. Sample
//! recording and alert dispatch degrade instead of returning errors.

use std::io;

use thiserror::Error;

/// The main error type for the monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML decoding errors
    #[error("TOML parse error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    /// TOML encoding errors
    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    /// Prometheus registry or encoder errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Periodic task could not be scheduled
    #[error("Scheduling error: {0}")]
    Scheduling(String),

    /// Generic errors
    #[error("{0}")]
    Generic(String),
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Configuration parsing error: {reason}")]
    ParseError { reason: String },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// Check if the caller can retry or continue with defaults
    pub fn is_recoverable(&self) -> bool {
        match self {
            MonitorError::Config(ConfigError::FileNotFound { .. }) => true,
            MonitorError::Config(_) => false,
            MonitorError::TomlDecode(_) => false,
            MonitorError::Scheduling(_) => true,
            MonitorError::Io(io_error) => {
                matches!(io_error.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock)
            }
            _ => true,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            MonitorError::Config(_) => "config",
            MonitorError::Io(_) => "io",
            MonitorError::Serialization(_) => "serialization",
            MonitorError::TomlDecode(_) | MonitorError::TomlEncode(_) => "toml",
            MonitorError::Metrics(_) => "metrics",
            MonitorError::Scheduling(_) => "scheduling",
            MonitorError::Generic(_) => "generic",
        }
    }
}

impl From<String> for MonitorError {
    fn from(msg: String) -> Self {
        MonitorError::Generic(msg)
    }
}

impl From<&str> for MonitorError {
    fn from(msg: &str) -> Self {
        MonitorError::Generic(msg.to_string())
    }
}
