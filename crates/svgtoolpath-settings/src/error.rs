//! Error types for the settings crate.
//!
//! Covers reading, parsing, writing and validating configuration files.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, saving or validating a [`Config`](crate::Config).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("Failed to access config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file content is malformed.
    #[error("Invalid {format} config: {reason}")]
    Parse { format: String, reason: String },

    /// The configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// A configuration value is out of its valid range.
    #[error("Invalid setting '{key}': {reason}")]
    Invalid { key: String, reason: String },

    /// The configuration file format is not supported.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for svgtoolpath_core::Error {
    fn from(err: ConfigError) -> Self {
        svgtoolpath_core::Error::config(err.to_string())
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
