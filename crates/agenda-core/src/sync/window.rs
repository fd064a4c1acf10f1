//! Bounded time window for the pull phase.

use serde::{Deserialize, Serialize};

use crate::config::SyncConfig;

/// Inclusive range of event start times (Unix ms) fetched from the remote
/// calendar. Bounded so a pass never scans the whole history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    pub start: i64,
    pub end: i64,
}

impl SyncWindow {
    /// Window centered on `now_ms` using the configured bounds
    pub const fn around(now_ms: i64, config: &SyncConfig) -> Self {
        let (past, future) = config.window_offsets_ms();
        Self {
            start: now_ms.saturating_sub(past),
            end: now_ms.saturating_add(future),
        }
    }

    /// Whether an event starting at `start_ms` falls inside the window
    pub const fn contains(&self, start_ms: i64) -> bool {
        start_ms >= self.start && start_ms <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400_000;

    #[test]
    fn default_window_spans_a_year_each_way() {
        let now = 1_700_000_000_000;
        let window = SyncWindow::around(now, &SyncConfig::default());
        assert_eq!(window.start, now - 365 * DAY);
        assert_eq!(window.end, now + 365 * DAY);
    }

    #[test]
    fn contains_is_inclusive() {
        let window = SyncWindow::around(0, &SyncConfig::default().with_pull_window(1, 1));
        assert!(window.contains(-DAY));
        assert!(window.contains(DAY));
        assert!(!window.contains(DAY + 1));
    }

    #[test]
    fn huge_bounds_saturate() {
        let config = SyncConfig::default().with_pull_window(i64::MAX, i64::MAX);
        let window = SyncWindow::around(0, &config);
        assert_eq!(window.start, i64::MIN + 1);
        assert_eq!(window.end, i64::MAX);
    }
}
