//! Conflict detection

use crate::models::{Event, RemoteEvent};

/// Whether both sides were modified after the last point of agreement.
///
/// An event that was never synced has no baseline and cannot conflict; it
/// is simply created on the other side. A change on only one side is an
/// ordinary update, not a conflict.
pub fn has_conflict(local: &Event, remote: &RemoteEvent) -> bool {
    let Some(last_synced_at) = local.last_synced_at else {
        return false;
    };
    local.modified_at > last_synced_at && remote.modified_at > last_synced_at
}
