//! Core error types for windowminder-core.
//!
//! Errors are split by concern with thiserror. Receiver errors never reach
//! callers of a check; the dispatcher records and logs them instead.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for windowminder-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Receiver-related errors
    #[error("Receiver error: {0}")]
    Receiver(#[from] ReceiverError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Control server errors
    #[error("Server error: {0}")]
    Server(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home/config directory could not be prepared
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Errors raised by a receiver while configuring or notifying.
#[derive(Error, Debug)]
pub enum ReceiverError {
    /// The receiver rejected its configuration table
    #[error("Invalid configuration for '{receiver}': {message}")]
    InvalidConfig { receiver: String, message: String },

    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote endpoint answered with a non-success status
    #[error("Unexpected HTTP {status} from {url}: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },

    /// The remote endpoint answered with a body we could not use
    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    /// Generic receiver failure
    #[error("{0}")]
    Custom(String),
}

impl ReceiverError {
    pub fn invalid_config(receiver: &str, message: impl Into<String>) -> Self {
        ReceiverError::InvalidConfig {
            receiver: receiver.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
