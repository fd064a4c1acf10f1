use std::path::Path;

use agenda_core::store::LocalEventStore;
use agenda_core::util::normalize_text_option;
use agenda_core::Event;

use crate::cli::EditArgs;
use crate::commands::common::{
    normalize_event_identifier, normalize_title, open_store, parse_timestamp, resolve_event,
};
use crate::error::CliError;

/// Apply the requested edits; returns whether anything changed
pub fn apply_edits(event: &mut Event, args: EditArgs) -> Result<bool, CliError> {
    let mut edited = event.clone();

    if let Some(title) = args.title {
        edited.title = normalize_title(&title)?;
    }
    if let Some(start) = args.start {
        edited.start_at = parse_timestamp(&start)?;
    }
    if let Some(end) = args.end {
        edited.end_at = parse_timestamp(&end)?;
    }
    if args.location.is_some() {
        edited.location = normalize_text_option(args.location);
    }
    if args.notes.is_some() {
        edited.notes = normalize_text_option(args.notes);
    }

    if !edited.has_valid_span() {
        return Err(CliError::InvalidSpan);
    }
    if edited == *event {
        return Ok(false);
    }

    edited.touch();
    *event = edited;
    Ok(true)
}

pub async fn run_edit(args: EditArgs, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_event_identifier(&args.id)?;
    let store = open_store(db_path)?;
    let mut event = resolve_event(&normalized_id, &store).await?;
    if event.is_deleted {
        return Err(CliError::EventNotFound(normalized_id));
    }

    if apply_edits(&mut event, args)? {
        store.update(&event).await?;
    }
    println!("{}", event.id);
    Ok(())
}
