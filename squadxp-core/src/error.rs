//! Error types for squadxp-core

use thiserror::Error;

/// Main error type for the squadxp-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parse error for a log or agent file
    #[error("parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid glob or regex pattern
    #[error("invalid pattern: {0}")]
    Pattern(String),

    /// Export failed
    #[error("export error: {0}")]
    Export(String),
}

/// Result type alias for squadxp-core
pub type Result<T> = std::result::Result<T, Error>;
