//! Store contracts consumed by the sync engine, plus in-process and
//! file-backed implementations.

mod file;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Event, EventId, RemoteEvent};

pub use file::FileCalendarStore;
pub use memory::{MemoryCalendarStore, MemoryEventStore};

/// Access status reported by the remote calendar.
///
/// Platform-specific variants (full access, write-only, ...) are mapped onto
/// these four cases by the store adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    Authorized,
    Denied,
    Restricted,
    /// The user has not been asked yet; access may be requested
    #[default]
    Undetermined,
}

/// The application's own durable record of events.
#[async_trait]
pub trait LocalEventStore: Send + Sync {
    /// List every event, soft-deleted ones included
    async fn list(&self) -> Result<Vec<Event>>;

    /// Get an event by ID
    async fn get(&self, id: &EventId) -> Result<Option<Event>>;

    /// Find the event linked to the given remote record
    async fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Event>>;

    /// Insert a new event
    async fn create(&self, event: &Event) -> Result<()>;

    /// Replace a stored event with the given record, field for field.
    ///
    /// Implementations must not restamp `modified_at`.
    async fn update(&self, event: &Event) -> Result<()>;

    /// Permanently remove an event
    async fn delete(&self, id: &EventId) -> Result<()>;
}

/// An external calendar reachable through an authorization-gated API.
#[async_trait]
pub trait RemoteCalendarStore: Send + Sync {
    /// Current access status
    async fn check_authorization(&self) -> Result<AuthorizationStatus>;

    /// Ask for access; returns whether it was granted
    async fn request_authorization(&self) -> Result<bool>;

    /// Events starting within `[start, end]` (Unix ms)
    async fn query_range(&self, start: i64, end: i64) -> Result<Vec<RemoteEvent>>;

    /// Get a record by its remote ID
    async fn get(&self, id: &str) -> Result<Option<RemoteEvent>>;

    /// Create a record; returns it as stored, carrying the assigned ID and
    /// modification stamp
    async fn create(&self, event: &RemoteEvent) -> Result<RemoteEvent>;

    /// Overwrite a record; returns it as stored
    async fn update(&self, id: &str, event: &RemoteEvent) -> Result<RemoteEvent>;

    /// Delete a record
    async fn delete(&self, id: &str) -> Result<()>;
}
