//! Error types for configuration

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration-related errors
///
/// Every variant is raised before any request leaves the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingField(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Private key file does not exist
    #[error("Private key file not found: {0}")]
    KeyFileNotFound(PathBuf),

    /// Private key file exists but could not be read
    #[error("Private key file {path} is not readable: {source}")]
    KeyFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Private key could not be parsed as an EC P-256 key
    #[error("Invalid private key in {path}: {message}")]
    InvalidKey { path: PathBuf, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Shorthand for an [`ConfigError::InvalidValue`]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
