//! In-memory store implementations.
//!
//! Useful for embedding the engine without persistence and for exercising
//! sync behavior in tests. The calendar side mimics a real provider: it
//! assigns its own IDs and modification stamps.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AuthorizationStatus, LocalEventStore, RemoteCalendarStore};
use crate::error::{Error, Result};
use crate::models::{Event, EventId, RemoteEvent};
use crate::util::unix_millis_now;

/// Local event store backed by a `Vec`, preserving insertion order.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: Mutex<Vec<Event>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given events
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: Mutex::new(events.into_iter().collect()),
        }
    }

    /// Snapshot of all stored events
    pub async fn snapshot(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }
}

fn ensure_remote_id_free(events: &[Event], candidate: &Event) -> Result<()> {
    let Some(remote_id) = candidate.remote_id.as_deref() else {
        return Ok(());
    };
    let taken = events
        .iter()
        .any(|event| event.id != candidate.id && event.remote_id.as_deref() == Some(remote_id));
    if taken {
        return Err(Error::InvalidInput(format!(
            "remote id {remote_id} is already linked to another event"
        )));
    }
    Ok(())
}

#[async_trait]
impl LocalEventStore for MemoryEventStore {
    async fn list(&self) -> Result<Vec<Event>> {
        Ok(self.events.lock().await.clone())
    }

    async fn get(&self, id: &EventId) -> Result<Option<Event>> {
        let events = self.events.lock().await;
        Ok(events.iter().find(|event| event.id == *id).cloned())
    }

    async fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Event>> {
        let events = self.events.lock().await;
        Ok(events
            .iter()
            .find(|event| event.remote_id.as_deref() == Some(remote_id))
            .cloned())
    }

    async fn create(&self, event: &Event) -> Result<()> {
        let mut events = self.events.lock().await;
        if events.iter().any(|existing| existing.id == event.id) {
            return Err(Error::InvalidInput(format!(
                "event {} already exists",
                event.id
            )));
        }
        ensure_remote_id_free(&events, event)?;
        events.push(event.clone());
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<()> {
        let mut events = self.events.lock().await;
        ensure_remote_id_free(&events, event)?;
        let slot = events
            .iter_mut()
            .find(|existing| existing.id == event.id)
            .ok_or_else(|| Error::NotFound(event.id.to_string()))?;
        *slot = event.clone();
        Ok(())
    }

    async fn delete(&self, id: &EventId) -> Result<()> {
        let mut events = self.events.lock().await;
        let before = events.len();
        events.retain(|event| event.id != *id);
        if events.len() == before {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct CalendarState {
    events: BTreeMap<String, RemoteEvent>,
    status: AuthorizationStatus,
    grant_on_request: bool,
    last_stamp: i64,
}

impl CalendarState {
    /// Strictly increasing modification stamps, like a provider's change log.
    fn next_stamp(&mut self) -> i64 {
        self.last_stamp = unix_millis_now().max(self.last_stamp + 1);
        self.last_stamp
    }
}

/// Remote calendar held in memory.
#[derive(Debug)]
pub struct MemoryCalendarStore {
    state: Mutex<CalendarState>,
}

impl Default for MemoryCalendarStore {
    fn default() -> Self {
        Self::with_authorization(AuthorizationStatus::Authorized)
    }
}

impl MemoryCalendarStore {
    /// An empty, already-authorized calendar
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty calendar reporting the given authorization status.
    ///
    /// Access requests are granted unless [`Self::set_grant_on_request`]
    /// says otherwise.
    pub fn with_authorization(status: AuthorizationStatus) -> Self {
        Self {
            state: Mutex::new(CalendarState {
                events: BTreeMap::new(),
                status,
                grant_on_request: true,
                last_stamp: 0,
            }),
        }
    }

    pub async fn set_authorization(&self, status: AuthorizationStatus) {
        self.state.lock().await.status = status;
    }

    /// Decide how an access request is answered
    pub async fn set_grant_on_request(&self, grant: bool) {
        self.state.lock().await.grant_on_request = grant;
    }

    /// Store a record verbatim, as if edited by another client.
    ///
    /// Keeps the given `modified_at`; assigns an ID when `id` is empty.
    /// Returns the stored ID.
    pub async fn insert_external(&self, mut event: RemoteEvent) -> String {
        if event.id.is_empty() {
            event.id = Uuid::new_v4().to_string();
        }
        let mut state = self.state.lock().await;
        state.last_stamp = state.last_stamp.max(event.modified_at);
        let id = event.id.clone();
        state.events.insert(id.clone(), event);
        id
    }

    /// Remove a record out of band; returns whether it existed
    pub async fn remove_external(&self, id: &str) -> bool {
        self.state.lock().await.events.remove(id).is_some()
    }

    /// Snapshot of all stored records, ordered by ID
    pub async fn events(&self) -> Vec<RemoteEvent> {
        self.state.lock().await.events.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RemoteCalendarStore for MemoryCalendarStore {
    async fn check_authorization(&self) -> Result<AuthorizationStatus> {
        Ok(self.state.lock().await.status)
    }

    async fn request_authorization(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.status == AuthorizationStatus::Undetermined {
            state.status = if state.grant_on_request {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            };
        }
        Ok(state.status == AuthorizationStatus::Authorized)
    }

    async fn query_range(&self, start: i64, end: i64) -> Result<Vec<RemoteEvent>> {
        let state = self.state.lock().await;
        let mut events = state
            .events
            .values()
            .filter(|event| event.start_at >= start && event.start_at <= end)
            .cloned()
            .collect::<Vec<_>>();
        events.sort_by_key(|event| event.start_at);
        Ok(events)
    }

    async fn get(&self, id: &str) -> Result<Option<RemoteEvent>> {
        Ok(self.state.lock().await.events.get(id).cloned())
    }

    async fn create(&self, event: &RemoteEvent) -> Result<RemoteEvent> {
        let mut state = self.state.lock().await;
        let mut stored = event.clone();
        stored.id = Uuid::new_v4().to_string();
        stored.modified_at = state.next_stamp();
        state.events.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: &str, event: &RemoteEvent) -> Result<RemoteEvent> {
        let mut state = self.state.lock().await;
        if !state.events.contains_key(id) {
            return Err(Error::NotFound(format!("remote event {id}")));
        }
        let mut stored = event.clone();
        stored.id = id.to_string();
        stored.modified_at = state.next_stamp();
        state.events.insert(id.to_string(), stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .events
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("remote event {id}")))
    }
}
