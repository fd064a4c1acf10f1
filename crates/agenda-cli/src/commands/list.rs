use std::path::Path;

use agenda_core::store::LocalEventStore;

use crate::commands::common::{event_to_list_item, format_event_lines, open_store, EventListItem};
use crate::error::CliError;

pub async fn run_list(
    include_deleted: bool,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let events = if include_deleted {
        store.list().await?
    } else {
        store.list_active().await?
    };

    if as_json {
        let json_items = events
            .iter()
            .map(event_to_list_item)
            .collect::<Vec<EventListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if events.is_empty() {
        println!("No events.");
    } else {
        for line in format_event_lines(&events) {
            println!("{line}");
        }
    }

    Ok(())
}
