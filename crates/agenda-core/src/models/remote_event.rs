//! Remote calendar event model

use serde::{Deserialize, Serialize};

/// An event as held by the external calendar.
///
/// `id` and `modified_at` are owned by the remote store: the engine never
/// chooses them, it only reads them back from create/update responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    /// Remote-assigned identifier (empty until created remotely)
    pub id: String,
    pub title: String,
    /// Start timestamp (Unix ms)
    pub start_at: i64,
    /// End timestamp (Unix ms)
    pub end_at: i64,
    pub location: Option<String>,
    pub notes: Option<String>,
    /// Calendar the event is filed under; mirrors the local category
    pub calendar: String,
    /// RFC 5545 recurrence rule (e.g. `FREQ=WEEKLY;BYDAY=MO`)
    pub recurrence_rule: Option<String>,
    /// Last modification timestamp assigned by the remote store (Unix ms)
    pub modified_at: i64,
}

impl RemoteEvent {
    /// Whether the event repeats
    pub const fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }

    /// Whether the event was modified after the given agreement point.
    ///
    /// Without a baseline every remote record counts as changed.
    pub fn changed_since(&self, last_synced_at: Option<i64>) -> bool {
        last_synced_at.map_or(true, |synced| self.modified_at > synced)
    }

    /// Short human label used in logs and sync reports
    pub fn describe(&self) -> String {
        format!("\"{}\" (remote {})", self.title, self.id)
    }
}
