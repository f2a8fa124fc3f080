//! Error handling for SVGToolpath
//!
//! The geometry compiler itself never fails: malformed input is skipped and
//! logged. These errors belong to the outer surfaces only:
//! - Document errors (XML that is not well-formed)
//! - Configuration errors
//! - I/O errors while reading drawings or writing G-code
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Document error type
///
/// Represents failures to turn source text into an element tree.
#[derive(Error, Debug, Clone)]
pub enum DocumentError {
    /// The XML could not be parsed
    #[error("Malformed XML at {position}: {reason}")]
    MalformedXml {
        /// Row and column reported by the XML parser.
        position: String,
        /// The parser's description of the problem.
        reason: String,
    },

    /// The document has no `<svg>` root element
    #[error("Document root is <{tag}>, expected <svg>")]
    NotSvg {
        /// The tag name of the root element that was found.
        tag: String,
    },
}

/// Main error type for SVGToolpath
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Document error
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Check if this is a document error
    pub fn is_document_error(&self) -> bool {
        matches!(self, Error::Document(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
