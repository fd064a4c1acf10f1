use std::path::Path;

use agenda_core::store::LocalEventStore;

use crate::commands::common::{normalize_event_identifier, open_store, resolve_event};
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_event_identifier(id)?;
    let store = open_store(db_path)?;
    let mut event = resolve_event(&normalized_id, &store).await?;

    if !event.is_deleted {
        event.mark_deleted();
        store.update(&event).await?;
    }
    println!("{}", event.id);
    Ok(())
}
