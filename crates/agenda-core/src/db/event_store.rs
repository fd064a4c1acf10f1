//! SQLite implementation of `LocalEventStore`

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Event, EventId};
use crate::store::LocalEventStore;

const EVENT_COLUMNS: &str = "id, title, start_at, end_at, category, location, notes, \
     is_recurring, recurrence_rule, remote_id, last_synced_at, created_at, modified_at, is_deleted";

/// Local event store persisted in `SQLite`.
///
/// The connection sits behind an async mutex so the store can be shared
/// with the sync engine across tasks.
pub struct SqliteEventStore {
    db: Mutex<Database>,
}

impl SqliteEventStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Open (and migrate) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Open an in-memory store (primarily for tests)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Events that are not soft-deleted, ordered by start time
    pub async fn list_active(&self) -> Result<Vec<Event>> {
        let db = self.db.lock().await;
        let mut stmt = db.connection().prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE is_deleted = 0 ORDER BY start_at ASC"
        ))?;
        let events = stmt
            .query_map([], parse_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    /// IDs starting with `prefix`, at most `limit` of them
    pub async fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        let mut stmt = db
            .connection()
            .prepare("SELECT id FROM events WHERE id LIKE ?1 || '%' ORDER BY id LIMIT ?2")?;
        let ids = stmt
            .query_map(params![prefix, limit as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }
}

/// Parse an event from a database row
fn parse_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    let id: String = row.get(0)?;
    let id = id.parse::<EventId>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(Event {
        id,
        title: row.get(1)?,
        start_at: row.get(2)?,
        end_at: row.get(3)?,
        category: row.get(4)?,
        location: row.get(5)?,
        notes: row.get(6)?,
        is_recurring: row.get::<_, i32>(7)? != 0,
        recurrence_rule: row.get(8)?,
        remote_id: row.get(9)?,
        last_synced_at: row.get(10)?,
        created_at: row.get(11)?,
        modified_at: row.get(12)?,
        is_deleted: row.get::<_, i32>(13)? != 0,
    })
}

fn query_one(conn: &Connection, filter: &str, value: &str) -> Result<Option<Event>> {
    let event = conn
        .query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE {filter} = ?1"),
            params![value],
            parse_event,
        )
        .optional()?;
    Ok(event)
}

#[async_trait]
impl LocalEventStore for SqliteEventStore {
    async fn list(&self) -> Result<Vec<Event>> {
        let db = self.db.lock().await;
        let mut stmt = db.connection().prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY start_at ASC"
        ))?;
        let events = stmt
            .query_map([], parse_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    async fn get(&self, id: &EventId) -> Result<Option<Event>> {
        let db = self.db.lock().await;
        query_one(db.connection(), "id", &id.as_str())
    }

    async fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Event>> {
        let db = self.db.lock().await;
        query_one(db.connection(), "remote_id", remote_id)
    }

    async fn create(&self, event: &Event) -> Result<()> {
        let db = self.db.lock().await;
        db.connection().execute(
            &format!(
                "INSERT INTO events ({EVENT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                event.id.as_str(),
                event.title,
                event.start_at,
                event.end_at,
                event.category,
                event.location,
                event.notes,
                i32::from(event.is_recurring),
                event.recurrence_rule,
                event.remote_id,
                event.last_synced_at,
                event.created_at,
                event.modified_at,
                i32::from(event.is_deleted),
            ],
        )?;
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<()> {
        let db = self.db.lock().await;
        let rows = db.connection().execute(
            "UPDATE events SET
                title = ?2, start_at = ?3, end_at = ?4, category = ?5, location = ?6,
                notes = ?7, is_recurring = ?8, recurrence_rule = ?9, remote_id = ?10,
                last_synced_at = ?11, created_at = ?12, modified_at = ?13, is_deleted = ?14
             WHERE id = ?1",
            params![
                event.id.as_str(),
                event.title,
                event.start_at,
                event.end_at,
                event.category,
                event.location,
                event.notes,
                i32::from(event.is_recurring),
                event.recurrence_rule,
                event.remote_id,
                event.last_synced_at,
                event.created_at,
                event.modified_at,
                i32::from(event.is_deleted),
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(event.id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &EventId) -> Result<()> {
        let db = self.db.lock().await;
        let rows = db
            .connection()
            .execute("DELETE FROM events WHERE id = ?1", params![id.as_str()])?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn setup() -> SqliteEventStore {
        SqliteEventStore::open_in_memory().unwrap()
    }

    fn linked(title: &str, remote_id: &str) -> Event {
        let mut event = Event::new(title, 1_000, 2_000);
        event.remote_id = Some(remote_id.to_string());
        event.last_synced_at = Some(event.modified_at);
        event
    }

    #[tokio::test]
    async fn test_create_and_get_round_trips_all_fields() {
        let store = setup();
        let mut event = linked("Standup", "r-1");
        event.location = Some("Room 4".to_string());
        event.notes = Some("daily".to_string());
        event.is_recurring = true;
        event.recurrence_rule = Some("FREQ=DAILY".to_string());
        event.category = "work".to_string();

        store.create(&event).await.unwrap();
        let fetched = store.get(&event.id).await.unwrap().unwrap();
        assert_eq!(fetched, event);
    }

    #[tokio::test]
    async fn test_find_by_remote_id() {
        let store = setup();
        let event = linked("Standup", "r-1");
        store.create(&event).await.unwrap();
        store.create(&Event::new("Unlinked", 0, 1)).await.unwrap();

        let found = store.find_by_remote_id("r-1").await.unwrap().unwrap();
        assert_eq!(found.id, event.id);
        assert!(store.find_by_remote_id("r-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_remote_link_is_rejected() {
        let store = setup();
        store.create(&linked("A", "r-1")).await.unwrap();
        let error = store.create(&linked("B", "r-1")).await.unwrap_err();
        assert!(matches!(error, Error::Sqlite(_)));
    }

    #[tokio::test]
    async fn test_update_writes_verbatim() {
        let store = setup();
        let mut event = Event::new("Draft", 0, 1);
        store.create(&event).await.unwrap();

        event.title = "Final".to_string();
        event.modified_at = 42;
        event.last_synced_at = Some(41);
        store.update(&event).await.unwrap();

        let fetched = store.get(&event.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Final");
        assert_eq!(fetched.modified_at, 42);
        assert_eq!(fetched.last_synced_at, Some(41));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = setup();
        let error = store.update(&Event::new("ghost", 0, 1)).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_active_hides_tombstones() {
        let store = setup();
        let keep = Event::new("Keep", 2_000, 3_000);
        let mut gone = Event::new("Gone", 1_000, 2_000);
        gone.mark_deleted();
        store.create(&keep).await.unwrap();
        store.create(&gone).await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), 2);
        let active = store.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let store = setup();
        let event = Event::new("Bye", 0, 1);
        store.create(&event).await.unwrap();
        store.delete(&event.id).await.unwrap();

        assert!(store.get(&event.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete(&event.id).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_list_ids_by_prefix() {
        let store = setup();
        let event = Event::new("Prefix", 0, 1);
        store.create(&event).await.unwrap();

        let prefix = event.id.as_str().chars().take(8).collect::<String>();
        let ids = store.list_ids_by_prefix(&prefix, 3).await.unwrap();
        assert_eq!(ids, vec![event.id.as_str()]);
    }

    #[tokio::test]
    async fn test_store_persists_on_disk() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("agenda.db");
        let event = Event::new("Persisted", 0, 1);

        SqliteEventStore::open(&path)
            .unwrap()
            .create(&event)
            .await
            .unwrap();

        let reopened = SqliteEventStore::open(&path).unwrap();
        assert!(reopened.get(&event.id).await.unwrap().is_some());
    }
}
