//! Remote calendar persisted as a single JSON document.
//!
//! Stands in for a hosted provider when running the CLI. Every operation
//! reads the document, applies the change, and writes it back through a
//! temporary file so a crash never leaves a half-written calendar.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AuthorizationStatus, RemoteCalendarStore};
use crate::error::{Error, Result};
use crate::models::RemoteEvent;
use crate::util::unix_millis_now;

const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CalendarDocument {
    #[serde(default = "default_document_version")]
    version: u32,
    #[serde(default)]
    last_stamp: i64,
    #[serde(default)]
    events: Vec<RemoteEvent>,
}

const fn default_document_version() -> u32 {
    DOCUMENT_VERSION
}

impl CalendarDocument {
    fn next_stamp(&mut self) -> i64 {
        self.last_stamp = unix_millis_now().max(self.last_stamp + 1);
        self.last_stamp
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.events.iter().position(|event| event.id == id)
    }
}

/// File-backed remote calendar. Access is always granted.
#[derive(Debug)]
pub struct FileCalendarStore {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl FileCalendarStore {
    /// Open (or lazily create) the calendar document at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CalendarDocument> {
        if !self.path.exists() {
            return Ok(CalendarDocument {
                version: DOCUMENT_VERSION,
                ..CalendarDocument::default()
            });
        }

        let raw = std::fs::read_to_string(&self.path)?;
        let document = serde_json::from_str::<CalendarDocument>(&raw)?;
        if document.version != DOCUMENT_VERSION {
            return Err(Error::RemoteUnavailable(format!(
                "unsupported calendar document version {} at {}",
                document.version,
                self.path.display()
            )));
        }
        Ok(document)
    }

    fn save(&self, document: &CalendarDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let payload = serde_json::to_string_pretty(document)?;
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, payload)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl RemoteCalendarStore for FileCalendarStore {
    async fn check_authorization(&self) -> Result<AuthorizationStatus> {
        Ok(AuthorizationStatus::Authorized)
    }

    async fn request_authorization(&self) -> Result<bool> {
        Ok(true)
    }

    async fn query_range(&self, start: i64, end: i64) -> Result<Vec<RemoteEvent>> {
        let _guard = self.io_lock.lock().await;
        let document = self.load()?;
        let mut events = document
            .events
            .into_iter()
            .filter(|event| event.start_at >= start && event.start_at <= end)
            .collect::<Vec<_>>();
        events.sort_by_key(|event| event.start_at);
        Ok(events)
    }

    async fn get(&self, id: &str) -> Result<Option<RemoteEvent>> {
        let _guard = self.io_lock.lock().await;
        let document = self.load()?;
        Ok(document.events.into_iter().find(|event| event.id == id))
    }

    async fn create(&self, event: &RemoteEvent) -> Result<RemoteEvent> {
        let _guard = self.io_lock.lock().await;
        let mut document = self.load()?;

        let mut stored = event.clone();
        stored.id = Uuid::new_v4().to_string();
        stored.modified_at = document.next_stamp();
        document.events.push(stored.clone());

        self.save(&document)?;
        Ok(stored)
    }

    async fn update(&self, id: &str, event: &RemoteEvent) -> Result<RemoteEvent> {
        let _guard = self.io_lock.lock().await;
        let mut document = self.load()?;
        let index = document
            .position(id)
            .ok_or_else(|| Error::NotFound(format!("remote event {id}")))?;

        let mut stored = event.clone();
        stored.id = id.to_string();
        stored.modified_at = document.next_stamp();
        document.events[index] = stored.clone();

        self.save(&document)?;
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.io_lock.lock().await;
        let mut document = self.load()?;
        let index = document
            .position(id)
            .ok_or_else(|| Error::NotFound(format!("remote event {id}")))?;
        document.events.remove(index);
        self.save(&document)
    }
}
