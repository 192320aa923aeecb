use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::display::{PresenceActivity, PresenceDisplay};
use crate::domain::ReconcilerSnapshot;

/// Round-robins the presence display over the live roster.
pub struct PresenceScheduler {
    snapshots: watch::Receiver<Arc<ReconcilerSnapshot>>,
    display: Arc<dyn PresenceDisplay>,
    /// Roster position shown last; `None` before the first rotation or after
    /// the roster emptied.
    index: Option<usize>,
}

impl PresenceScheduler {
    pub fn new(
        snapshots: watch::Receiver<Arc<ReconcilerSnapshot>>,
        display: Arc<dyn PresenceDisplay>,
    ) -> Self {
        Self {
            snapshots,
            display,
            index: None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Advance to the next live channel and display it.
    ///
    /// Reads the latest committed roster. An index left out of range by a
    /// shrinking roster restarts at 0.
    pub fn rotate(&mut self) -> Option<PresenceActivity> {
        let snapshot = Arc::clone(&self.snapshots.borrow());
        let roster = snapshot.roster();

        if roster.is_empty() {
            if self.index.take().is_some() {
                debug!("Live roster is empty, clearing presence");
            }
            self.display.display(None);
            return None;
        }

        let next = match self.index {
            Some(current) if current < roster.len() => (current + 1) % roster.len(),
            _ => 0,
        };
        self.index = Some(next);

        let activity = roster.get(next).map(PresenceActivity::from);
        self.display.display(activity.clone());
        activity
    }

    /// Rotate every `interval` until cancelled, then clear the display.
    pub async fn run(mut self, interval: Duration, cancel: CancellationToken) {
        info!(interval = ?interval, "Presence rotation started");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.rotate();
                }
            }
        }

        self.display.display(None);
        debug!("Presence rotation stopped");
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::domain::test_support::snapshot_of;

    #[derive(Default)]
    struct RecordingDisplay {
        shown: Mutex<Vec<Option<String>>>,
    }

    impl PresenceDisplay for RecordingDisplay {
        fn display(&self, activity: Option<PresenceActivity>) {
            self.shown.lock().push(activity.map(|a| a.id));
        }
    }

    fn scheduler(
        ids: &[&str],
    ) -> (
        PresenceScheduler,
        watch::Sender<Arc<ReconcilerSnapshot>>,
        Arc<RecordingDisplay>,
    ) {
        let (tx, rx) = watch::channel(Arc::new(snapshot_of(ids)));
        let display = Arc::new(RecordingDisplay::default());
        let scheduler = PresenceScheduler::new(rx, display.clone());
        (scheduler, tx, display)
    }

    #[test]
    fn test_rotation_cycles_through_roster() {
        let (mut scheduler, _tx, display) = scheduler(&["alice", "bob", "carol"]);

        let shown: Vec<_> = (0..4)
            .map(|_| scheduler.rotate().map(|a| a.id))
            .collect();

        assert_eq!(
            shown,
            vec![
                Some("alice".to_string()),
                Some("bob".to_string()),
                Some("carol".to_string()),
                Some("alice".to_string()),
            ]
        );
        assert_eq!(display.shown.lock().len(), 4);
    }

    #[test]
    fn test_rotation_resets_index_when_roster_shrinks() {
        let (mut scheduler, tx, _display) = scheduler(&["alice", "bob", "carol"]);
        for _ in 0..3 {
            scheduler.rotate();
        }
        assert_eq!(scheduler.index(), Some(2));

        tx.send(Arc::new(snapshot_of(&["bob"]))).unwrap();

        let activity = scheduler.rotate().unwrap();
        assert_eq!(activity.id, "bob");
        assert_eq!(scheduler.index(), Some(0));
    }

    #[test]
    fn test_empty_roster_clears_display() {
        let (mut scheduler, tx, display) = scheduler(&["alice"]);
        scheduler.rotate();

        tx.send(Arc::new(snapshot_of(&[]))).unwrap();

        assert_eq!(scheduler.rotate(), None);
        assert_eq!(scheduler.index(), None);
        assert_eq!(display.shown.lock().last(), Some(&None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_clears_display_on_cancel() {
        let (scheduler, _tx, display) = scheduler(&["alice"]);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(scheduler.run(Duration::from_secs(30), cancel.clone()));
        tokio::time::sleep(Duration::from_secs(61)).await;
        cancel.cancel();
        handle.await.unwrap();

        let shown = display.shown.lock();
        assert_eq!(shown.len(), 4);
        assert_eq!(shown.last(), Some(&None));
    }
}
