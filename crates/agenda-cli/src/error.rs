use std::io;

use agenda_core::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] agenda_core::Error),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Event title cannot be empty")]
    EmptyTitle,
    #[error("Event ID cannot be empty")]
    EmptyEventId,
    #[error("Event not found for id/prefix: {0}")]
    EventNotFound(String),
    #[error("{0}")]
    AmbiguousEventId(String),
    #[error("Invalid time '{0}' (expected RFC 3339 or \"YYYY-MM-DD HH:MM\")")]
    InvalidTimestamp(String),
    #[error("Event must not end before it starts")]
    InvalidSpan,
    #[error("Configuration error: {0}")]
    Config(String),
}
