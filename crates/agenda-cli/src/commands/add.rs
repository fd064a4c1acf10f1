use std::path::Path;

use agenda_core::store::LocalEventStore;
use agenda_core::util::normalize_text_option;
use agenda_core::Event;

use crate::cli::AddArgs;
use crate::commands::common::{normalize_title, open_store, parse_timestamp};
use crate::error::CliError;

/// Build a new, unlinked event from command-line input
pub fn event_from_args(args: AddArgs) -> Result<Event, CliError> {
    let title = normalize_title(&args.title.join(" "))?;
    let start_at = parse_timestamp(&args.start)?;
    let end_at = parse_timestamp(&args.end)?;

    let mut event = Event::new(title, start_at, end_at);
    if !event.has_valid_span() {
        return Err(CliError::InvalidSpan);
    }
    if let Some(category) = normalize_text_option(args.category) {
        event.category = category;
    }
    event.location = normalize_text_option(args.location);
    event.notes = normalize_text_option(args.notes);
    event.recurrence_rule = normalize_text_option(args.rrule);
    event.is_recurring = event.recurrence_rule.is_some();
    Ok(event)
}

pub async fn run_add(args: AddArgs, db_path: &Path) -> Result<(), CliError> {
    let event = event_from_args(args)?;

    let store = open_store(db_path)?;
    store.create(&event).await?;

    println!("{}", event.id);
    Ok(())
}
