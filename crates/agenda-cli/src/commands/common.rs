use std::env;
use std::path::{Path, PathBuf};

use agenda_core::db::SqliteEventStore;
use agenda_core::store::LocalEventStore;
use agenda_core::sync::ConflictRecord;
use agenda_core::util::format_timestamp;
use agenda_core::{Event, EventId};
use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;

use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;

#[derive(Debug, Serialize)]
pub struct EventListItem {
    pub id: String,
    pub title: String,
    pub start_at: i64,
    pub end_at: i64,
    pub start_iso: String,
    pub category: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub recurrence_rule: Option<String>,
    pub remote_id: Option<String>,
    pub status: &'static str,
}

/// Sync state of an event as shown to the user
pub fn sync_status(event: &Event) -> &'static str {
    if event.is_deleted {
        "deleted"
    } else if !event.is_linked() {
        "local"
    } else if event.has_local_changes() {
        "pending"
    } else {
        "synced"
    }
}

pub fn short_id(id: &EventId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

pub fn format_event_lines(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .map(|event| {
            let when = format_timestamp(event.start_at);
            let status = sync_status(event);
            let title = if event.is_recurring {
                format!("{} (repeats)", event.title)
            } else {
                event.title.clone()
            };
            format!(
                "{:<13}  {when:<20}  {status:<7}  {title}",
                short_id(&event.id)
            )
        })
        .collect()
}

pub fn event_to_list_item(event: &Event) -> EventListItem {
    EventListItem {
        id: event.id.to_string(),
        title: event.title.clone(),
        start_at: event.start_at,
        end_at: event.end_at,
        start_iso: format_timestamp(event.start_at),
        category: event.category.clone(),
        location: event.location.clone(),
        notes: event.notes.clone(),
        recurrence_rule: event.recurrence_rule.clone(),
        remote_id: event.remote_id.clone(),
        status: sync_status(event),
    }
}

pub fn format_conflict_lines(conflicts: &[ConflictRecord]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{}  {:<11}  winner={:<6}  event={}  local={} remote={}",
                format_timestamp(conflict.resolved_at),
                conflict.policy,
                conflict.winner,
                conflict.title,
                conflict.local_modified_at,
                conflict.remote_modified_at
            )
        })
        .collect()
}

/// Parse a user-supplied time as Unix milliseconds (UTC)
pub fn parse_timestamp(value: &str) -> Result<i64, CliError> {
    let trimmed = value.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(date_time.timestamp_millis());
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc().timestamp_millis())
        .map_err(|_| CliError::InvalidTimestamp(value.to_string()))
}

pub fn normalize_title(title: &str) -> Result<String, CliError> {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        Err(CliError::EmptyTitle)
    } else {
        Ok(collapsed)
    }
}

pub fn normalize_event_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyEventId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Find an event by full ID or unique ID prefix
pub async fn resolve_event(query: &str, store: &SqliteEventStore) -> Result<Event, CliError> {
    if let Ok(event_id) = query.parse::<EventId>() {
        if let Some(event) = store.get(&event_id).await? {
            return Ok(event);
        }
    }

    let matching_ids = store.list_ids_by_prefix(query, 3).await?;

    match matching_ids.len() {
        0 => Err(CliError::EventNotFound(query.to_string())),
        1 => {
            let resolved_id = matching_ids[0]
                .parse::<EventId>()
                .map_err(|_| CliError::EventNotFound(query.to_string()))?;
            store
                .get(&resolved_id)
                .await?
                .ok_or_else(|| CliError::EventNotFound(query.to_string()))
        }
        _ => {
            let options = matching_ids
                .iter()
                .map(|id| id.chars().take(SHORT_ID_LEN).collect::<String>())
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousEventId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn open_store(path: &Path) -> Result<SqliteEventStore, CliError> {
    Ok(SqliteEventStore::open(path)?)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("AGENDA_DB_PATH").map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("agenda").join("agenda.db"))
        .ok_or_else(|| CliError::Config("failed to resolve data directory".to_string()))
}

pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_config_path {
        return Ok(path);
    }
    default_config_path()
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("agenda").join("sync-config.json"))
        .ok_or_else(|| CliError::Config("failed to resolve config directory".to_string()))
}
