//! Reconciler state model.
//!
//! Only live channels are stored. A channel without an entry is offline, so
//! "a handle exists iff the channel is live" holds by construction.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::status::LiveStatus;

/// Opaque reference to a posted notification (a Discord message id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationHandle(String);

impl NotificationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Known state of a live channel.
#[derive(Debug, Clone)]
pub struct LiveEntry {
    /// Metadata as last rendered into the notification.
    pub status: LiveStatus,
    /// Handle of the one notification for this channel.
    pub handle: NotificationHandle,
    /// When the channel was first seen live. Not touched by refreshes.
    pub live_since: DateTime<Utc>,
    /// Last time the notification was created or edited.
    pub last_metadata_refresh: Instant,
}

/// Per-channel state as seen by readers.
#[derive(Debug, Clone)]
pub enum EntityState {
    Offline,
    Live(LiveEntry),
}

impl EntityState {
    pub fn is_live(&self) -> bool {
        matches!(self, EntityState::Live(_))
    }

    pub fn handle(&self) -> Option<&NotificationHandle> {
        match self {
            EntityState::Live(entry) => Some(&entry.handle),
            EntityState::Offline => None,
        }
    }
}

/// One slot of the live roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub id: String,
    pub display_name: String,
    pub title: String,
    pub viewer_count: Option<u64>,
}

/// Ordered list of live channels, derived from a committed snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveRoster {
    entries: Vec<RosterEntry>,
}

impl LiveRoster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RosterEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }
}

/// Committed reconciler state, published after every completed tick.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerSnapshot {
    entries: BTreeMap<String, LiveEntry>,
    roster: LiveRoster,
    tick: u64,
    completed_at: Option<DateTime<Utc>>,
}

impl ReconcilerSnapshot {
    pub fn new(
        entries: BTreeMap<String, LiveEntry>,
        tick: u64,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        let roster = LiveRoster::new(
            entries
                .iter()
                .map(|(id, entry)| RosterEntry {
                    id: id.clone(),
                    display_name: entry.status.display_name.clone(),
                    title: entry.status.title.clone(),
                    viewer_count: entry.status.viewer_count,
                })
                .collect(),
        );

        Self {
            entries,
            roster,
            tick,
            completed_at,
        }
    }

    pub fn state(&self, id: &str) -> EntityState {
        match self.entries.get(id) {
            Some(entry) => EntityState::Live(entry.clone()),
            None => EntityState::Offline,
        }
    }

    pub fn is_live(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn live_entries(&self) -> impl Iterator<Item = (&str, &LiveEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn live_count(&self) -> usize {
        self.entries.len()
    }

    pub fn roster(&self) -> &LiveRoster {
        &self.roster
    }

    /// Number of completed ticks this snapshot reflects.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_snapshot_state_lookup() {
        let snapshot = snapshot_of(&["alice", "bob"]);

        assert!(snapshot.is_live("alice"));
        assert!(snapshot.state("alice").handle().is_some());
        assert!(!snapshot.state("carol").is_live());
        assert!(snapshot.state("carol").handle().is_none());
        assert_eq!(snapshot.live_count(), 2);
    }

    #[test]
    fn test_roster_is_ordered_by_id() {
        let snapshot = snapshot_of(&["zed", "alice", "mike"]);
        let ids: Vec<_> = snapshot
            .roster()
            .entries()
            .iter()
            .map(|entry| entry.id.as_str())
            .collect();
        assert_eq!(ids, vec!["alice", "mike", "zed"]);
    }

    #[test]
    fn test_default_snapshot_is_empty() {
        let snapshot = ReconcilerSnapshot::default();
        assert!(snapshot.roster().is_empty());
        assert_eq!(snapshot.tick(), 0);
        assert!(snapshot.completed_at().is_none());
    }
}
