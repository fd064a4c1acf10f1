//! Sync report model

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ConflictPolicy, Side};
use crate::models::EventId;
use crate::util::compact_text;

/// A per-event failure recorded during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    /// Human label of the event (title and identifier)
    pub event: String,
    pub message: String,
}

/// A conflict settled during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub event_id: EventId,
    pub remote_id: String,
    pub title: String,
    /// Local modification stamp at the time of the conflict (Unix ms)
    pub local_modified_at: i64,
    /// Remote modification stamp at the time of the conflict (Unix ms)
    pub remote_modified_at: i64,
    /// Resolution timestamp (Unix ms)
    pub resolved_at: i64,
    pub winner: Side,
    pub policy: ConflictPolicy,
}

/// Outcome of one full sync pass.
///
/// Produced even when individual events failed; callers should inspect
/// [`SyncReport::errors`] on every successful return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub conflicts_resolved: usize,
    /// Per-event failures in the order they happened
    pub errors: Vec<SyncFailure>,
    pub conflicts: Vec<ConflictRecord>,
    /// Pass start (Unix ms)
    pub started_at: i64,
    /// Pass end (Unix ms)
    pub finished_at: i64,
}

impl SyncReport {
    pub(crate) fn started(started_at: i64) -> Self {
        Self {
            started_at,
            ..Self::default()
        }
    }

    /// Records created, updated or deleted on either side
    pub const fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the pass found nothing to do
    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0 && self.conflicts_resolved == 0 && self.errors.is_empty()
    }

    /// Pass duration in milliseconds
    pub const fn duration_ms(&self) -> i64 {
        self.finished_at.saturating_sub(self.started_at)
    }

    pub(crate) fn record_failure(&mut self, event: String, error: &impl fmt::Display) {
        self.errors.push(SyncFailure {
            event,
            message: compact_text(&error.to_string()),
        });
    }

    pub(crate) fn record_conflict(&mut self, record: ConflictRecord) {
        self.conflicts_resolved += 1;
        self.conflicts.push(record);
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {}, updated {}, deleted {}, conflicts resolved {}, errors {}",
            self.created,
            self.updated,
            self.deleted,
            self.conflicts_resolved,
            self.errors.len()
        )
    }
}
