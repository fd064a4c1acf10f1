use std::path::Path;

use agenda_core::sync::ConflictPolicy;
use agenda_core::SyncConfig;

use crate::cli::ConfigCommands;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, config_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_config_show(config_path),
        ConfigCommands::Init {
            policy,
            past_days,
            future_days,
        } => run_config_init(config_path, policy, past_days, future_days),
    }
}

pub fn run_config_show(config_path: &Path) -> Result<(), CliError> {
    let config = SyncConfig::load_from_path(config_path)?;
    println!("# {}", config_path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn run_config_init(
    config_path: &Path,
    policy: Option<ConflictPolicy>,
    past_days: Option<i64>,
    future_days: Option<i64>,
) -> Result<(), CliError> {
    let existing = SyncConfig::load_from_path(config_path)?;
    let config = merge_config(existing, policy, past_days, future_days);
    config
        .validate()
        .map_err(|error| CliError::Config(error.to_string()))?;

    config.save_to_path(config_path)?;
    println!("Saved sync config to {}", config_path.display());
    Ok(())
}

/// Overlay explicit flags on the stored config
pub fn merge_config(
    existing: SyncConfig,
    policy: Option<ConflictPolicy>,
    past_days: Option<i64>,
    future_days: Option<i64>,
) -> SyncConfig {
    let past_days = past_days.unwrap_or(existing.pull_window_past_days);
    let future_days = future_days.unwrap_or(existing.pull_window_future_days);
    let policy = policy.unwrap_or(existing.policy);

    existing
        .with_policy(policy)
        .with_pull_window(past_days, future_days)
}
