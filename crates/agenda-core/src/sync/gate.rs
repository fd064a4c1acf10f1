//! Authorization gate for the remote calendar

use super::SyncError;
use crate::store::{AuthorizationStatus, RemoteCalendarStore};

/// Checks (and, when allowed, requests) access to the remote calendar before
/// any other I/O against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationGate {
    may_request: bool,
}

impl AuthorizationGate {
    /// `may_request` controls whether an undetermined status triggers an
    /// interactive access request
    pub const fn new(may_request: bool) -> Self {
        Self { may_request }
    }

    /// Succeed only when the calendar grants access.
    ///
    /// Denial and restriction are terminal for the current attempt.
    pub async fn ensure_authorized<R>(&self, remote: &R) -> Result<(), SyncError>
    where
        R: RemoteCalendarStore + ?Sized,
    {
        let status = remote
            .check_authorization()
            .await
            .map_err(|error| SyncError::RemoteStoreUnavailable(error.to_string()))?;

        match status {
            AuthorizationStatus::Authorized => Ok(()),
            AuthorizationStatus::Denied => Err(SyncError::PermissionDenied),
            AuthorizationStatus::Restricted => Err(SyncError::PermissionRestricted),
            AuthorizationStatus::Undetermined if !self.may_request => {
                Err(SyncError::PermissionUndetermined { requestable: true })
            }
            AuthorizationStatus::Undetermined => {
                tracing::info!("Requesting calendar access");
                let granted = remote
                    .request_authorization()
                    .await
                    .map_err(|error| SyncError::RemoteStoreUnavailable(error.to_string()))?;
                if granted {
                    Ok(())
                } else {
                    Err(SyncError::PermissionDenied)
                }
            }
        }
    }
}
