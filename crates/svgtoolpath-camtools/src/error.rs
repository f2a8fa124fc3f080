//! Error types for the CAM tools crate.

use std::io;
use svgtoolpath_settings::ConfigError;
use thiserror::Error;

/// Errors that can occur while ordering or serializing a toolpath.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// The command list doesn't describe a valid toolpath.
    #[error("Invalid toolpath: {0}")]
    InvalidToolpath(String),

    /// The configuration was rejected before writing.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// I/O error while writing output.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization of the layer data failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<CamToolError> for svgtoolpath_core::Error {
    fn from(err: CamToolError) -> Self {
        match err {
            CamToolError::IoError(io) => svgtoolpath_core::Error::Io(io),
            CamToolError::Config(config) => config.into(),
            other => svgtoolpath_core::Error::other(other.to_string()),
        }
    }
}

/// Result type for CAM tool operations.
pub type Result<T> = std::result::Result<T, CamToolError>;
