//! Error types for agenda-core

use thiserror::Error;

/// Result type alias using agenda-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by stores and configuration loading.
///
/// These are per-operation errors. The sync engine records them against the
/// event being processed and keeps going; see [`crate::sync::SyncError`] for
/// the errors that abort a whole pass.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Event not found
    #[error("Event not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote calendar could not be reached or refused the request
    #[error("Remote calendar unavailable: {0}")]
    RemoteUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
