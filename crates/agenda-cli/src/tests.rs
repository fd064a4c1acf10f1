use std::path::PathBuf;

use agenda_core::db::SqliteEventStore;
use agenda_core::store::{FileCalendarStore, LocalEventStore, RemoteCalendarStore};
use agenda_core::sync::ConflictPolicy;
use agenda_core::{Event, SyncConfig};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use crate::cli::{AddArgs, EditArgs};
use crate::commands::add::{event_from_args, run_add};
use crate::commands::common::{
    format_event_lines, normalize_event_identifier, normalize_title, parse_timestamp,
    resolve_event, sync_status,
};
use crate::commands::config::{merge_config, run_config_init};
use crate::commands::delete::run_delete;
use crate::commands::edit::apply_edits;
use crate::commands::sync::run_sync;
use crate::error::CliError;

fn add_args(title: &str) -> AddArgs {
    AddArgs {
        title: vec![title.to_string()],
        start: "2030-01-02 09:00".to_string(),
        end: "2030-01-02 09:15".to_string(),
        category: None,
        location: None,
        notes: None,
        rrule: None,
    }
}

fn edit_args(id: &str) -> EditArgs {
    EditArgs {
        id: id.to_string(),
        title: None,
        start: None,
        end: None,
        location: None,
        notes: None,
    }
}

#[test]
fn parse_timestamp_accepts_rfc3339_and_short_form() {
    assert_eq!(
        parse_timestamp("2030-01-02T09:00:00Z").unwrap(),
        parse_timestamp("2030-01-02 09:00").unwrap()
    );
    assert_eq!(
        parse_timestamp("2030-01-02T10:00:00+01:00").unwrap(),
        parse_timestamp(" 2030-01-02 09:00 ").unwrap()
    );
    assert_eq!(parse_timestamp("1970-01-01 00:01").unwrap(), 60_000);
}

#[test]
fn parse_timestamp_rejects_garbage() {
    assert!(matches!(
        parse_timestamp("next tuesday"),
        Err(CliError::InvalidTimestamp(_))
    ));
}

#[test]
fn normalize_title_collapses_whitespace() {
    assert_eq!(normalize_title("  Team \n sync ").unwrap(), "Team sync");
    assert!(matches!(normalize_title(" \t "), Err(CliError::EmptyTitle)));
}

#[test]
fn normalize_event_identifier_rejects_empty() {
    assert_eq!(normalize_event_identifier(" 0192 ").unwrap(), "0192");
    assert!(matches!(
        normalize_event_identifier("  "),
        Err(CliError::EmptyEventId)
    ));
}

#[test]
fn event_from_args_marks_recurrence_and_category() {
    let mut args = add_args("Standup");
    args.category = Some("work".to_string());
    args.rrule = Some("FREQ=DAILY".to_string());
    args.location = Some("   ".to_string());

    let event = event_from_args(args).unwrap();
    assert_eq!(event.category, "work");
    assert!(event.is_recurring);
    assert_eq!(event.location, None);
    assert!(!event.is_linked());
}

#[test]
fn event_from_args_rejects_inverted_span() {
    let mut args = add_args("Backwards");
    args.end = "2030-01-01 09:00".to_string();
    assert!(matches!(event_from_args(args), Err(CliError::InvalidSpan)));
}

#[test]
fn apply_edits_touches_only_when_changed() {
    let mut event = Event::new("Review", 0, 60_000);
    event.last_synced_at = Some(event.modified_at);

    assert!(!apply_edits(&mut event, edit_args("x")).unwrap());
    assert!(!event.has_local_changes());

    let mut args = edit_args("x");
    args.title = Some("Design review".to_string());
    assert!(apply_edits(&mut event, args).unwrap());
    assert_eq!(event.title, "Design review");
    assert!(event.has_local_changes());
}

#[test]
fn sync_status_reflects_link_state() {
    let mut event = Event::new("Status", 0, 1);
    assert_eq!(sync_status(&event), "local");

    event.remote_id = Some("r-1".to_string());
    event.last_synced_at = Some(event.modified_at);
    assert_eq!(sync_status(&event), "synced");

    event.touch();
    assert_eq!(sync_status(&event), "pending");

    event.mark_deleted();
    assert_eq!(sync_status(&event), "deleted");
}

#[test]
fn format_event_lines_show_short_id_time_and_status() {
    let event = Event::new("Planning", 0, 1);
    let lines = format_event_lines(std::slice::from_ref(&event));
    let short = event.id.to_string().chars().take(13).collect::<String>();

    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(&short));
    assert!(lines[0].contains("1970-01-01 00:00 UTC"));
    assert!(lines[0].contains("local"));
    assert!(lines[0].ends_with("Planning"));
}

#[test]
fn merge_config_keeps_unset_fields() {
    let existing = SyncConfig::default().with_pull_window(30, 60);
    let merged = merge_config(existing, Some(ConflictPolicy::RemoteWins), None, Some(90));

    assert_eq!(merged.policy, ConflictPolicy::RemoteWins);
    assert_eq!(merged.pull_window_past_days, 30);
    assert_eq!(merged.pull_window_future_days, 90);
}

#[test]
fn config_init_rejects_negative_window() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("sync-config.json");

    let error = run_config_init(&path, None, Some(-1), None).unwrap_err();
    assert!(matches!(error, CliError::Config(_)));
    assert!(!path.exists());
}

#[tokio::test]
async fn resolve_event_accepts_unique_prefix() {
    let store = SqliteEventStore::open_in_memory().unwrap();
    let event = Event::new("Prefixed", 0, 1);
    store.create(&event).await.unwrap();

    let prefix = event.id.to_string().chars().take(10).collect::<String>();
    let resolved = resolve_event(&prefix, &store).await.unwrap();
    assert_eq!(resolved.id, event.id);

    let full = resolve_event(&event.id.to_string(), &store).await.unwrap();
    assert_eq!(full.id, event.id);
}

#[tokio::test]
async fn resolve_event_reports_missing_and_ambiguous() {
    let store = SqliteEventStore::open_in_memory().unwrap();
    store.create(&Event::new("One", 0, 1)).await.unwrap();
    store.create(&Event::new("Two", 0, 1)).await.unwrap();

    assert!(matches!(
        resolve_event("zzzz", &store).await,
        Err(CliError::EventNotFound(_))
    ));
    // Both IDs are UUIDv7 and share the leading hex digit of the timestamp.
    assert!(matches!(
        resolve_event("0", &store).await,
        Err(CliError::AmbiguousEventId(_))
    ));
}

#[tokio::test]
async fn delete_marks_tombstone_until_sync() {
    let tmp = tempdir().unwrap();
    let db_path = tmp.path().join("agenda.db");
    let remote_path = tmp.path().join("calendar.json");
    let config_path = tmp.path().join("sync-config.json");

    run_add(add_args("Dentist"), &db_path).await.unwrap();
    run_sync(&remote_path, None, true, &db_path, &config_path)
        .await
        .unwrap();
    let remote = FileCalendarStore::open(&remote_path);
    assert_eq!(remote.query_range(i64::MIN, i64::MAX).await.unwrap().len(), 1);

    let event = {
        let store = SqliteEventStore::open(&db_path).unwrap();
        store.list().await.unwrap().remove(0)
    };
    run_delete(&event.id.to_string(), &db_path).await.unwrap();
    {
        let store = SqliteEventStore::open(&db_path).unwrap();
        let tombstone = store.get(&event.id).await.unwrap().unwrap();
        assert!(tombstone.is_deleted);
        assert!(store.list_active().await.unwrap().is_empty());
    }

    run_sync(&remote_path, None, true, &db_path, &config_path)
        .await
        .unwrap();
    assert!(remote.query_range(i64::MIN, i64::MAX).await.unwrap().is_empty());
    let store = SqliteEventStore::open(&db_path).unwrap();
    assert!(store.list().await.unwrap().is_empty());
}

#[test]
fn db_path_flag_wins() {
    let explicit = PathBuf::from("/tmp/explicit.db");
    assert_eq!(
        crate::commands::common::resolve_db_path(Some(explicit.clone())).unwrap(),
        explicit
    );
}

#[test]
fn log_filter_rejects_malformed_directive() {
    assert!(crate::log_filter("agenda=info").is_ok());
    assert!(matches!(
        crate::log_filter("agenda=loud"),
        Err(CliError::Config(_))
    ));
}
