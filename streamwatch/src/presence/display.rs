use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::RosterEntry;

/// The status line shown for one live channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceActivity {
    pub id: String,
    pub display_name: String,
    pub title: String,
}

impl PresenceActivity {
    pub fn text(&self) -> String {
        format!("Watching {}: {}", self.display_name, self.title)
    }
}

impl From<&RosterEntry> for PresenceActivity {
    fn from(entry: &RosterEntry) -> Self {
        Self {
            id: entry.id.clone(),
            display_name: entry.display_name.clone(),
            title: entry.title.clone(),
        }
    }
}

/// Where the rotating status goes.
///
/// `display` must not block: implementations hand the activity off (channel,
/// spawned task) and return immediately.
pub trait PresenceDisplay: Send + Sync + 'static {
    /// Show `activity`, or clear the status when `None`.
    fn display(&self, activity: Option<PresenceActivity>);
}

/// Publishes the current activity on a watch channel for a chat-bot session
/// (or anything else) to pick up.
pub struct WatchPresenceDisplay {
    tx: watch::Sender<Option<PresenceActivity>>,
}

impl WatchPresenceDisplay {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PresenceActivity>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<PresenceActivity> {
        self.tx.borrow().clone()
    }
}

impl Default for WatchPresenceDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceDisplay for WatchPresenceDisplay {
    fn display(&self, activity: Option<PresenceActivity>) {
        self.tx.send_if_modified(|current| {
            if *current == activity {
                return false;
            }
            match &activity {
                Some(activity) => debug!(channel = %activity.id, "Presence: {}", activity.text()),
                None => debug!("Presence cleared"),
            }
            *current = activity;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str) -> PresenceActivity {
        PresenceActivity {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            title: "title".to_string(),
        }
    }

    #[test]
    fn test_activity_text() {
        assert_eq!(activity("alice").text(), "Watching ALICE: title");
    }

    #[test]
    fn test_watch_display_publishes_changes_only() {
        let display = WatchPresenceDisplay::new();
        let mut rx = display.subscribe();

        display.display(Some(activity("alice")));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().id, "alice");

        display.display(Some(activity("alice")));
        assert!(!rx.has_changed().unwrap());

        display.display(None);
        assert!(rx.has_changed().unwrap());
        assert_eq!(display.current(), None);
    }
}
