//! Error types for Scribe

use thiserror::Error;

/// Main error type for Scribe operations
#[derive(Error, Debug)]
pub enum ScribeError {
    /// Configuration errors (missing credential, bad config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage-related errors (SQLite, file system)
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Scribe operations
pub type Result<T> = std::result::Result<T, ScribeError>;
