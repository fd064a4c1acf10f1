//! Sync orchestrator

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};

use super::{
    has_conflict, AuthorizationGate, ConflictHandler, ConflictRecord, ConflictResolver, Side,
    SyncError, SyncReport, SyncWindow,
};
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::models::{Event, EventId, RemoteEvent};
use crate::store::{LocalEventStore, RemoteCalendarStore};
use crate::util::unix_millis_now;

/// Where a pass currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    Authorizing,
    PushingLocal,
    PullingRemote,
    ReconcilingDeletes,
    Done,
    Failed,
}

impl SyncPhase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Marks a pass as in flight; released on drop, including when the pass
/// future is dropped part-way.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    phase: &'a watch::Sender<SyncPhase>,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, phase: &'a watch::Sender<SyncPhase>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { flag, phase })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let unfinished = !self.phase.borrow().is_terminal();
        if unfinished {
            self.phase.send_replace(SyncPhase::Failed);
        }
        self.flag.store(false, Ordering::Release);
    }
}

/// Bookkeeping shared by the phases of a single pass
struct Pass {
    report: SyncReport,
    /// Events whose processing already failed this pass; later phases leave
    /// them alone instead of retrying
    failed: HashSet<EventId>,
    /// Remote IDs known to exist after the push and pull phases
    seen_remote_ids: HashSet<String>,
}

/// Reconciles a [`LocalEventStore`] with a [`RemoteCalendarStore`].
///
/// Stores are injected; the engine holds no global state. One pass runs at
/// a time per engine: a concurrent call to [`Self::perform_full_sync`] is
/// rejected with [`SyncError::AlreadyRunning`].
pub struct SyncEngine<L, R> {
    local: L,
    remote: R,
    config: SyncConfig,
    gate: AuthorizationGate,
    resolver: ConflictResolver,
    syncing: AtomicBool,
    phase: watch::Sender<SyncPhase>,
    /// Remote copies created for an event whose link could not be stored and
    /// that could not be removed straight away either
    orphans: Mutex<HashSet<String>>,
}

impl<L, R> SyncEngine<L, R>
where
    L: LocalEventStore,
    R: RemoteCalendarStore,
{
    pub fn new(local: L, remote: R, config: SyncConfig) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Self {
            gate: AuthorizationGate::new(config.request_authorization),
            resolver: ConflictResolver::new(config.policy),
            local,
            remote,
            config,
            syncing: AtomicBool::new(false),
            phase,
            orphans: Mutex::new(HashSet::new()),
        }
    }

    /// Install the decision hook used by [`super::ConflictPolicy::Manual`]
    #[must_use]
    pub fn with_conflict_handler(mut self, handler: impl ConflictHandler + 'static) -> Self {
        self.resolver = self.resolver.with_handler(handler);
        self
    }

    pub const fn local(&self) -> &L {
        &self.local
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Whether a pass is in flight
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Current state machine phase
    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    /// Observe phase transitions
    pub fn subscribe(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    /// Run one full pass: push, pull, then reconcile deletions.
    ///
    /// Fails only when access to the remote calendar is refused, when either
    /// side cannot be enumerated at all, or when a pass is already running.
    /// Everything else is recorded in the returned report.
    pub async fn perform_full_sync(&self) -> std::result::Result<SyncReport, SyncError> {
        let _in_flight =
            InFlight::acquire(&self.syncing, &self.phase).ok_or(SyncError::AlreadyRunning)?;

        tracing::info!("Starting full sync (policy: {})", self.resolver.policy());
        let mut pass = Pass {
            report: SyncReport::started(unix_millis_now()),
            failed: HashSet::new(),
            seen_remote_ids: HashSet::new(),
        };

        match self.run_phases(&mut pass).await {
            Ok(()) => {
                let mut report = pass.report;
                report.finished_at = unix_millis_now();
                self.enter(SyncPhase::Done);
                tracing::info!(
                    created = report.created,
                    updated = report.updated,
                    deleted = report.deleted,
                    conflicts = report.conflicts_resolved,
                    errors = report.errors.len(),
                    "Sync finished in {}ms",
                    report.duration_ms()
                );
                Ok(report)
            }
            Err(error) => {
                self.enter(SyncPhase::Failed);
                tracing::warn!("Sync aborted: {error}");
                Err(error)
            }
        }
    }

    fn enter(&self, phase: SyncPhase) {
        tracing::debug!("Sync phase -> {:?}", phase);
        self.phase.send_replace(phase);
    }

    async fn run_phases(&self, pass: &mut Pass) -> std::result::Result<(), SyncError> {
        self.enter(SyncPhase::Authorizing);
        self.gate.ensure_authorized(&self.remote).await?;

        self.enter(SyncPhase::PushingLocal);
        self.purge_orphans().await;
        let local_events = self
            .local
            .list()
            .await
            .map_err(|error| SyncError::Enumeration(error.to_string()))?;
        for event in &local_events {
            if let Err(error) = self.push_event(event, pass).await {
                self.record_failure(pass, &event.id, event.describe(), &error);
            }
        }

        self.enter(SyncPhase::PullingRemote);
        let window = SyncWindow::around(unix_millis_now(), &self.config);
        let remote_events = self
            .remote
            .query_range(window.start, window.end)
            .await
            .map_err(|error| SyncError::RemoteStoreUnavailable(error.to_string()))?;
        tracing::debug!(
            "Pulled {} remote events in window [{}, {}]",
            remote_events.len(),
            window.start,
            window.end
        );
        let orphans = self.orphans.lock().await.clone();
        for remote in &remote_events {
            if orphans.contains(&remote.id) {
                continue;
            }
            pass.seen_remote_ids.insert(remote.id.clone());
            if let Err(error) = self.pull_event(remote, pass).await {
                pass.report.record_failure(remote.describe(), &error);
                tracing::warn!("Failed to pull {}: {error}", remote.describe());
            }
        }

        self.enter(SyncPhase::ReconcilingDeletes);
        let local_events = self
            .local
            .list()
            .await
            .map_err(|error| SyncError::Enumeration(error.to_string()))?;
        for event in local_events
            .iter()
            .filter(|event| event.is_linked() && !event.is_deleted)
        {
            if pass.failed.contains(&event.id) {
                continue;
            }
            if let Err(error) = self.reconcile_deletion(event, pass).await {
                self.record_failure(pass, &event.id, event.describe(), &error);
            }
        }

        Ok(())
    }

    fn record_failure(
        &self,
        pass: &mut Pass,
        id: &EventId,
        label: String,
        error: &Error,
    ) {
        tracing::warn!("Failed to sync {label} during {:?}: {error}", self.phase());
        pass.failed.insert(*id);
        pass.report.record_failure(label, error);
    }

    // -----------------------------------------------------------------------
    // Phase 1: push local -> remote
    // -----------------------------------------------------------------------

    async fn push_event(&self, event: &Event, pass: &mut Pass) -> Result<()> {
        if event.is_deleted {
            return self.push_deletion(event, pass).await;
        }

        let Some(remote_id) = event.remote_id.as_deref() else {
            return self.create_remote(event, pass).await;
        };

        match self.remote.get(remote_id).await? {
            None if event.has_local_changes() => {
                tracing::debug!(
                    "Remote copy of {} is gone but it was edited locally; re-creating",
                    event.describe()
                );
                self.create_remote(event, pass).await
            }
            None => {
                tracing::debug!(
                    "Remote copy of {} is gone; leaving it for deletion reconciliation",
                    event.describe()
                );
                Ok(())
            }
            Some(remote) => {
                pass.seen_remote_ids.insert(remote.id.clone());
                if has_conflict(event, &remote) {
                    self.resolve_conflict(event, &remote, pass).await
                } else if event.has_local_changes() {
                    let stored = self.remote.update(remote_id, &event.to_remote()).await?;
                    let mut synced = event.clone();
                    synced.last_synced_at = Some(agreement_stamp(&synced, &stored));
                    self.local.update(&synced).await?;
                    pass.report.updated += 1;
                    tracing::debug!("Pushed update for {}", event.describe());
                    Ok(())
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Create the remote mirror and link the local event to it
    async fn create_remote(&self, event: &Event, pass: &mut Pass) -> Result<()> {
        let created = self.remote.create(&event.to_remote()).await?;

        let mut linked = event.clone();
        linked.remote_id = Some(created.id.clone());
        linked.last_synced_at = Some(agreement_stamp(&linked, &created));
        if let Err(error) = self.local.update(&linked).await {
            self.discard_unlinked(&created.id).await;
            return Err(error);
        }

        pass.seen_remote_ids.insert(created.id.clone());
        pass.report.created += 1;
        tracing::debug!("Created remote copy {} of {}", created.id, event.describe());
        Ok(())
    }

    /// Take back a remote copy nothing local points at. Left in the orphan
    /// set when the remote refuses, so the next pass neither mirrors it nor
    /// forgets it.
    async fn discard_unlinked(&self, remote_id: &str) {
        if let Err(error) = self.remote.delete(remote_id).await {
            tracing::warn!("Could not remove unlinked remote copy {remote_id}: {error}");
            self.orphans.lock().await.insert(remote_id.to_string());
        }
    }

    async fn purge_orphans(&self) {
        let mut orphans = self.orphans.lock().await;
        let pending = orphans.iter().cloned().collect::<Vec<_>>();
        for remote_id in pending {
            match self.remote.delete(&remote_id).await {
                Ok(()) | Err(Error::NotFound(_)) => {
                    orphans.remove(&remote_id);
                    tracing::debug!("Removed unlinked remote copy {remote_id}");
                }
                Err(error) => {
                    tracing::warn!("Unlinked remote copy {remote_id} is still there: {error}");
                }
            }
        }
    }

    /// Propagate a local soft delete, then purge the tombstone
    async fn push_deletion(&self, event: &Event, pass: &mut Pass) -> Result<()> {
        let Some(remote_id) = event.remote_id.as_deref() else {
            self.local.delete(&event.id).await?;
            return Ok(());
        };

        let Some(remote) = self.remote.get(remote_id).await? else {
            // Gone on both sides already.
            self.local.delete(&event.id).await?;
            return Ok(());
        };

        if has_conflict(event, &remote) {
            let winner = self.resolver.choose(event, &remote);
            if winner == Side::Remote {
                let mut restored = event.clone();
                restored.is_deleted = false;
                restored.apply_remote(&remote);
                restored.last_synced_at = Some(agreement_stamp(&restored, &remote));
                self.local.update(&restored).await?;
                pass.seen_remote_ids.insert(remote.id.clone());
                tracing::debug!(
                    "Remote edit of {} outlived its local deletion",
                    event.describe()
                );
            } else {
                self.remote.delete(remote_id).await?;
                self.local.delete(&event.id).await?;
                pass.report.deleted += 1;
            }
            pass.report
                .record_conflict(self.conflict_record(event, &remote, winner));
            return Ok(());
        }

        self.remote.delete(remote_id).await?;
        self.local.delete(&event.id).await?;
        pass.report.deleted += 1;
        tracing::debug!("Deleted remote copy of {}", event.describe());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Phase 2: pull remote -> local
    // -----------------------------------------------------------------------

    async fn pull_event(&self, remote: &RemoteEvent, pass: &mut Pass) -> Result<()> {
        let Some(local) = self.local.find_by_remote_id(&remote.id).await? else {
            let mut mirrored = Event::from_remote(remote);
            mirrored.last_synced_at = Some(agreement_stamp(&mirrored, remote));
            self.local.create(&mirrored).await?;
            pass.report.created += 1;
            tracing::debug!("Created local copy of {}", remote.describe());
            return Ok(());
        };

        if pass.failed.contains(&local.id) {
            return Ok(());
        }
        if local.is_deleted || local.last_synced_at.is_none() {
            // Pending push of a local deletion or of a never-stamped link.
            return Ok(());
        }

        if has_conflict(&local, remote) {
            return self.resolve_conflict(&local, remote, pass).await;
        }

        if remote.changed_since(local.last_synced_at) {
            let mut updated = local.clone();
            updated.apply_remote(remote);
            updated.last_synced_at = Some(agreement_stamp(&updated, remote));
            self.local.update(&updated).await?;
            pass.report.updated += 1;
            tracing::debug!("Pulled update for {}", local.describe());
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Phase 3: reconcile remote-side deletions
    // -----------------------------------------------------------------------

    async fn reconcile_deletion(&self, event: &Event, pass: &mut Pass) -> Result<()> {
        let Some(remote_id) = event.remote_id.as_deref() else {
            return Ok(());
        };
        if pass.seen_remote_ids.contains(remote_id) {
            return Ok(());
        }
        if event.has_local_changes() {
            tracing::warn!(
                "Keeping {}: it has local edits that were not pushed",
                event.describe()
            );
            return Ok(());
        }

        if self.remote.get(remote_id).await?.is_none() {
            self.local.delete(&event.id).await?;
            pass.report.deleted += 1;
            tracing::debug!(
                "Deleted {} after its remote copy disappeared",
                event.describe()
            );
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Conflicts
    // -----------------------------------------------------------------------

    /// Apply the configured policy and stamp the pair as agreeing
    async fn resolve_conflict(
        &self,
        local: &Event,
        remote: &RemoteEvent,
        pass: &mut Pass,
    ) -> Result<()> {
        let winner = self.resolver.choose(local, remote);
        let resolved = match winner {
            Side::Local => {
                let stored = self.remote.update(&remote.id, &local.to_remote()).await?;
                let mut resolved = local.clone();
                resolved.last_synced_at = Some(agreement_stamp(&resolved, &stored));
                resolved
            }
            Side::Remote => {
                let mut resolved = local.clone();
                resolved.apply_remote(remote);
                resolved.last_synced_at = Some(agreement_stamp(&resolved, remote));
                resolved
            }
        };
        self.local.update(&resolved).await?;

        tracing::debug!(
            "Resolved conflict on {} in favor of {winner} ({})",
            local.describe(),
            self.resolver.policy()
        );
        pass.report
            .record_conflict(self.conflict_record(local, remote, winner));
        Ok(())
    }

    fn conflict_record(&self, local: &Event, remote: &RemoteEvent, winner: Side) -> ConflictRecord {
        ConflictRecord {
            event_id: local.id,
            remote_id: remote.id.clone(),
            title: local.title.clone(),
            local_modified_at: local.modified_at,
            remote_modified_at: remote.modified_at,
            resolved_at: unix_millis_now(),
            winner,
            policy: self.resolver.policy(),
        }
    }
}

/// The point at which a local event and its remote copy are known to agree.
///
/// Never earlier than either side's modification stamp, so a write made by
/// this engine is not mistaken for a fresh edit on the next pass even when
/// the two stores' clocks disagree.
fn agreement_stamp(local: &Event, remote: &RemoteEvent) -> i64 {
    unix_millis_now()
        .max(local.modified_at)
        .max(remote.modified_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AuthorizationStatus, MemoryCalendarStore, MemoryEventStore};

    fn engine(
        local: MemoryEventStore,
        remote: MemoryCalendarStore,
    ) -> SyncEngine<MemoryEventStore, MemoryCalendarStore> {
        SyncEngine::new(local, remote, SyncConfig::default())
    }

    #[test]
    fn agreement_stamp_covers_both_sides() {
        let mut local = Event::new("x", 0, 1);
        local.modified_at = i64::MAX - 1;
        let mut remote = local.to_remote();
        remote.modified_at = i64::MAX;
        assert_eq!(agreement_stamp(&local, &remote), i64::MAX);
    }

    #[tokio::test]
    async fn phase_starts_idle_and_ends_done() {
        let engine = engine(MemoryEventStore::new(), MemoryCalendarStore::new());
        assert_eq!(engine.phase(), SyncPhase::Idle);

        let report = engine.perform_full_sync().await.unwrap();
        assert!(report.is_empty());
        assert_eq!(engine.phase(), SyncPhase::Done);
        assert!(!engine.is_syncing());
    }

    #[tokio::test]
    async fn denied_access_fails_before_touching_stores() {
        let local = MemoryEventStore::with_events([Event::new("Standup", 0, 1)]);
        let remote = MemoryCalendarStore::with_authorization(AuthorizationStatus::Denied);
        let engine = engine(local, remote);

        let error = engine.perform_full_sync().await.unwrap_err();
        assert!(error.is_permission_error());
        assert_eq!(engine.phase(), SyncPhase::Failed);
        assert!(engine.remote().is_empty().await);
        assert!(!engine.is_syncing());
    }

    #[tokio::test]
    async fn subscribers_observe_final_phase() {
        let engine = engine(MemoryEventStore::new(), MemoryCalendarStore::new());
        let receiver = engine.subscribe();
        engine.perform_full_sync().await.unwrap();
        assert_eq!(*receiver.borrow(), SyncPhase::Done);
    }

    #[tokio::test]
    async fn never_synced_local_tombstone_is_purged_silently() {
        let mut draft = Event::new("Draft", 0, 1);
        draft.mark_deleted();
        let engine = engine(
            MemoryEventStore::with_events([draft]),
            MemoryCalendarStore::new(),
        );

        let report = engine.perform_full_sync().await.unwrap();
        assert_eq!(report.total_changes(), 0);
        assert!(engine.local().snapshot().await.is_empty());
        assert!(engine.remote().is_empty().await);
    }
}
