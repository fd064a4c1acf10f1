//! Conflict resolution policy

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{Event, RemoteEvent};

/// How a conflict (both sides edited since the last sync) is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// The local record overwrites the remote one
    LocalWins,
    /// The remote record overwrites the local one
    RemoteWins,
    /// The strictly later modification wins; ties go to the remote side
    #[default]
    NewestWins,
    /// Ask the installed [`ConflictHandler`]; falls back to `NewestWins`
    Manual,
}

impl ConflictPolicy {
    pub const ALL: [Self; 4] = [
        Self::LocalWins,
        Self::RemoteWins,
        Self::NewestWins,
        Self::Manual,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalWins => "local_wins",
            Self::RemoteWins => "remote_wins",
            Self::NewestWins => "newest_wins",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    /// Accepts `local_wins`, `local-wins` and `localWins` spellings
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|policy| policy.as_str().replace('_', "") == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown conflict policy '{value}' (expected one of: local_wins, remote_wins, newest_wins, manual)"
                )
            })
    }
}

/// Which representation prevails in a resolved conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Local,
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.pad("local"),
            Self::Remote => f.pad("remote"),
        }
    }
}

/// Caller-supplied decision hook for [`ConflictPolicy::Manual`].
///
/// Returning `None` abstains and lets the resolver fall back to
/// newest-wins.
pub trait ConflictHandler: Send + Sync {
    fn choose(&self, local: &Event, remote: &RemoteEvent) -> Option<Side>;
}

impl<F> ConflictHandler for F
where
    F: Fn(&Event, &RemoteEvent) -> Option<Side> + Send + Sync,
{
    fn choose(&self, local: &Event, remote: &RemoteEvent) -> Option<Side> {
        self(local, remote)
    }
}

/// Newest-wins rule: the strictly later modification wins, ties go remote
pub fn newest_side(local: &Event, remote: &RemoteEvent) -> Side {
    if local.modified_at > remote.modified_at {
        Side::Local
    } else {
        Side::Remote
    }
}

/// Applies the configured [`ConflictPolicy`] to detected conflicts
#[derive(Clone, Default)]
pub struct ConflictResolver {
    policy: ConflictPolicy,
    handler: Option<Arc<dyn ConflictHandler>>,
}

impl fmt::Debug for ConflictResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConflictResolver")
            .field("policy", &self.policy)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl ConflictResolver {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            handler: None,
        }
    }

    /// Install the hook consulted under [`ConflictPolicy::Manual`]
    #[must_use]
    pub fn with_handler(mut self, handler: impl ConflictHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub const fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Pick the winning side for a conflicting pair
    pub fn choose(&self, local: &Event, remote: &RemoteEvent) -> Side {
        match self.policy {
            ConflictPolicy::LocalWins => Side::Local,
            ConflictPolicy::RemoteWins => Side::Remote,
            ConflictPolicy::NewestWins => newest_side(local, remote),
            ConflictPolicy::Manual => self
                .handler
                .as_ref()
                .and_then(|handler| handler.choose(local, remote))
                .unwrap_or_else(|| newest_side(local, remote)),
        }
    }
}
