use std::path::Path;

use agenda_core::store::FileCalendarStore;
use agenda_core::sync::ConflictPolicy;
use agenda_core::{SyncConfig, SyncEngine};

use crate::commands::common::{format_conflict_lines, open_store};
use crate::error::CliError;

pub async fn run_sync(
    remote_path: &Path,
    policy: Option<ConflictPolicy>,
    as_json: bool,
    db_path: &Path,
    config_path: &Path,
) -> Result<(), CliError> {
    let mut config = SyncConfig::load_from_path(config_path)?;
    if let Some(policy) = policy {
        config = config.with_policy(policy);
    }

    tracing::debug!(
        "Syncing {} with calendar {} (policy: {})",
        db_path.display(),
        remote_path.display(),
        config.policy
    );
    let store = open_store(db_path)?;
    let engine = SyncEngine::new(store, FileCalendarStore::open(remote_path), config);
    let report = engine.perform_full_sync().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Sync completed: {report}");
    for line in format_conflict_lines(&report.conflicts) {
        println!("  conflict  {line}");
    }
    for failure in &report.errors {
        eprintln!("  failed    {}: {}", failure.event, failure.message);
    }
    Ok(())
}
