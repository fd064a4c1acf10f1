//! Local event model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::RemoteEvent;
use crate::util::unix_millis_now;

/// Category assigned to events created without one
pub const DEFAULT_CATEGORY: &str = "personal";

/// A unique identifier for a local event, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Create a new unique event ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A locally-authored calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier
    pub id: EventId,
    pub title: String,
    /// Start timestamp (Unix ms)
    pub start_at: i64,
    /// End timestamp (Unix ms)
    pub end_at: i64,
    pub category: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub is_recurring: bool,
    /// RFC 5545 recurrence rule, present when `is_recurring` is set
    pub recurrence_rule: Option<String>,
    /// Identifier of the mirrored record in the remote calendar
    pub remote_id: Option<String>,
    /// Last point at which this event agreed with its remote mirror (Unix ms).
    ///
    /// Only the sync engine writes this field.
    pub last_synced_at: Option<i64>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last local modification timestamp (Unix ms)
    pub modified_at: i64,
    /// Soft delete flag so deletions can be propagated by sync
    pub is_deleted: bool,
}

impl Event {
    /// Create a new, unlinked event
    #[must_use]
    pub fn new(title: impl Into<String>, start_at: i64, end_at: i64) -> Self {
        let now = unix_millis_now();
        Self {
            id: EventId::new(),
            title: title.into(),
            start_at,
            end_at,
            category: DEFAULT_CATEGORY.to_string(),
            location: None,
            notes: None,
            is_recurring: false,
            recurrence_rule: None,
            remote_id: None,
            last_synced_at: None,
            created_at: now,
            modified_at: now,
            is_deleted: false,
        }
    }

    /// Create a local mirror of a remote record
    #[must_use]
    pub fn from_remote(remote: &RemoteEvent) -> Self {
        let mut event = Self::new(remote.title.clone(), remote.start_at, remote.end_at);
        event.apply_remote(remote);
        event
    }

    /// Record a local edit.
    ///
    /// The new modification stamp always lands strictly after both the
    /// previous one and the last sync point, so an edit made within the same
    /// millisecond as a sync still registers as a local change.
    pub fn touch(&mut self) {
        let floor = self
            .last_synced_at
            .map_or(self.modified_at, |synced| synced.max(self.modified_at));
        self.modified_at = unix_millis_now().max(floor + 1);
    }

    /// Soft delete this event (a local edit)
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.touch();
    }

    /// Whether the event is mirrored in the remote calendar
    pub const fn is_linked(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Whether the event was edited locally after its last sync.
    ///
    /// Events that were never synced always count as changed.
    pub fn has_local_changes(&self) -> bool {
        self.last_synced_at
            .map_or(true, |synced| self.modified_at > synced)
    }

    /// Overwrite the user-visible fields with the remote record's values and
    /// link to it. Local bookkeeping (`modified_at`, `last_synced_at`) is left
    /// for the caller to stamp.
    pub fn apply_remote(&mut self, remote: &RemoteEvent) {
        self.title.clone_from(&remote.title);
        self.start_at = remote.start_at;
        self.end_at = remote.end_at;
        self.category.clone_from(&remote.calendar);
        self.location.clone_from(&remote.location);
        self.notes.clone_from(&remote.notes);
        self.is_recurring = remote.is_recurring();
        self.recurrence_rule.clone_from(&remote.recurrence_rule);
        self.remote_id = Some(remote.id.clone());
    }

    /// Project this event onto the remote shape.
    ///
    /// `id` carries the current link (empty when unlinked) and `modified_at`
    /// the local stamp; the remote store replaces both on write.
    #[must_use]
    pub fn to_remote(&self) -> RemoteEvent {
        RemoteEvent {
            id: self.remote_id.clone().unwrap_or_default(),
            title: self.title.clone(),
            start_at: self.start_at,
            end_at: self.end_at,
            location: self.location.clone(),
            notes: self.notes.clone(),
            calendar: self.category.clone(),
            recurrence_rule: if self.is_recurring {
                self.recurrence_rule.clone()
            } else {
                None
            },
            modified_at: self.modified_at,
        }
    }

    /// Short human label used in logs and sync reports
    pub fn describe(&self) -> String {
        format!("\"{}\" ({})", self.title, self.id)
    }

    /// Whether the event's time span is well-formed
    pub const fn has_valid_span(&self) -> bool {
        self.end_at >= self.start_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_remote() -> RemoteEvent {
        RemoteEvent {
            id: "remote-7".to_string(),
            title: "Planning".to_string(),
            start_at: 10_000,
            end_at: 20_000,
            location: Some("Room 4".to_string()),
            notes: Some("bring roadmap".to_string()),
            calendar: "work".to_string(),
            recurrence_rule: Some("FREQ=WEEKLY;BYDAY=MO".to_string()),
            modified_at: 5_000,
        }
    }

    #[test]
    fn test_event_id_unique() {
        let id1 = EventId::new();
        let id2 = EventId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_event_id_parse() {
        let id = EventId::new();
        let parsed: EventId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_event_new_is_unlinked() {
        let event = Event::new("Standup", 1_000, 2_000);
        assert_eq!(event.category, DEFAULT_CATEGORY);
        assert!(!event.is_linked());
        assert!(event.last_synced_at.is_none());
        assert!(event.has_local_changes());
        assert_eq!(event.created_at, event.modified_at);
    }

    #[test]
    fn test_touch_lands_after_sync_point() {
        let mut event = Event::new("Standup", 1_000, 2_000);
        let far_future = unix_millis_now() + 60_000;
        event.last_synced_at = Some(far_future);
        event.modified_at = far_future;
        assert!(!event.has_local_changes());

        event.touch();
        assert!(event.modified_at > far_future);
        assert!(event.has_local_changes());
    }

    #[test]
    fn test_mark_deleted_counts_as_edit() {
        let mut event = Event::new("Standup", 1_000, 2_000);
        event.last_synced_at = Some(event.modified_at);
        event.mark_deleted();
        assert!(event.is_deleted);
        assert!(event.has_local_changes());
    }

    #[test]
    fn test_from_remote_mirrors_fields() {
        let remote = sample_remote();
        let event = Event::from_remote(&remote);

        assert_eq!(event.title, "Planning");
        assert_eq!(event.category, "work");
        assert_eq!(event.location.as_deref(), Some("Room 4"));
        assert!(event.is_recurring);
        assert_eq!(event.remote_id.as_deref(), Some("remote-7"));
        assert!(event.last_synced_at.is_none());
    }

    #[test]
    fn test_to_remote_drops_rule_when_not_recurring() {
        let mut event = Event::new("Lunch", 1_000, 2_000);
        event.recurrence_rule = Some("FREQ=DAILY".to_string());
        event.is_recurring = false;

        let remote = event.to_remote();
        assert_eq!(remote.id, "");
        assert_eq!(remote.recurrence_rule, None);
        assert_eq!(remote.calendar, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_apply_then_project_keeps_content() {
        let remote = sample_remote();
        let mut event = Event::new("placeholder", 0, 0);
        event.apply_remote(&remote);

        let projected = event.to_remote();
        assert_eq!(
            projected,
            RemoteEvent {
                modified_at: event.modified_at,
                ..remote
            }
        );
    }

    #[test]
    fn test_valid_span() {
        assert!(Event::new("ok", 1, 2).has_valid_span());
        assert!(!Event::new("backwards", 2, 1).has_valid_span());
    }
}
