//! Sync configuration.
//!
//! Provides `SyncConfig`, the caller-settable knobs of the sync engine. The
//! CLI persists it as JSON; embedders can build it in code.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sync::ConflictPolicy;

const DEFAULT_WINDOW_DAYS: i64 = 365;
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// How conflicting edits are settled
    #[serde(default)]
    pub policy: ConflictPolicy,
    /// How far back the pull phase looks, in days
    #[serde(default = "default_window_days")]
    pub pull_window_past_days: i64,
    /// How far ahead the pull phase looks, in days
    #[serde(default = "default_window_days")]
    pub pull_window_future_days: i64,
    /// Whether the engine may prompt for calendar access when the user has
    /// not decided yet
    #[serde(default = "default_request_authorization")]
    pub request_authorization: bool,
}

const fn default_window_days() -> i64 {
    DEFAULT_WINDOW_DAYS
}

const fn default_request_authorization() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            policy: ConflictPolicy::default(),
            pull_window_past_days: DEFAULT_WINDOW_DAYS,
            pull_window_future_days: DEFAULT_WINDOW_DAYS,
            request_authorization: true,
        }
    }
}

impl SyncConfig {
    /// Use a different conflict policy
    #[must_use]
    pub const fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a different pull window, in days either side of now
    #[must_use]
    pub const fn with_pull_window(mut self, past_days: i64, future_days: i64) -> Self {
        self.pull_window_past_days = past_days;
        self.pull_window_future_days = future_days;
        self
    }

    /// Pull window bounds as milliseconds relative to now
    pub const fn window_offsets_ms(&self) -> (i64, i64) {
        (
            self.pull_window_past_days.saturating_mul(MILLIS_PER_DAY),
            self.pull_window_future_days.saturating_mul(MILLIS_PER_DAY),
        )
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pull_window_past_days < 0 || self.pull_window_future_days < 0 {
            return Err(Error::Config(format!(
                "pull window must not be negative (past={}, future={})",
                self.pull_window_past_days, self.pull_window_future_days
            )));
        }
        Ok(())
    }

    /// Load config from a JSON file; a missing file yields the defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!(
                "failed to parse config at {}: {error}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write config as pretty JSON, creating parent directories
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        std::fs::write(path, format!("{payload}\n"))?;
        Ok(())
    }
}
