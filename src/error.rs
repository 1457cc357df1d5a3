//! Error types for the issue tracker
//!
//! Defines the error enum covering configuration, storage and I/O failures.
//! Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for issue tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Error type for issue tracker operations
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage backend errors that are not SQLite errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stored data that could not be decoded into an issue
    #[error("Corrupt record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
