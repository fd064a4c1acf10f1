//! Two-way synchronization between the local event store and a remote
//! calendar.
//!
//! A full pass runs three phases in order: push local changes, pull remote
//! changes within a bounded window, then reconcile remote-side deletions.
//! Edits made on both sides since the last agreement point are settled by a
//! [`ConflictResolver`].

mod detector;
mod engine;
mod gate;
mod report;
mod resolver;
mod window;


use thiserror::Error;

pub use detector::has_conflict;
pub use engine::{SyncEngine, SyncPhase};
pub use gate::AuthorizationGate;
pub use report::{ConflictRecord, SyncFailure, SyncReport};
pub use resolver::{newest_side, ConflictHandler, ConflictPolicy, ConflictResolver, Side};
pub use window::SyncWindow;

/// Errors that abort a whole sync pass.
///
/// Failures scoped to a single event never surface here; they are listed in
/// [`SyncReport::errors`] instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Calendar access was denied")]
    PermissionDenied,

    #[error("Calendar access is restricted on this device")]
    PermissionRestricted,

    #[error("Calendar access has not been granted yet (requestable: {requestable})")]
    PermissionUndetermined { requestable: bool },

    #[error("Remote calendar unavailable: {0}")]
    RemoteStoreUnavailable(String),

    #[error("Could not enumerate local events: {0}")]
    Enumeration(String),

    #[error("A sync pass is already running")]
    AlreadyRunning,
}

impl SyncError {
    /// Whether the failure comes from the authorization gate
    pub const fn is_permission_error(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied
                | Self::PermissionRestricted
                | Self::PermissionUndetermined { .. }
        )
    }
}
