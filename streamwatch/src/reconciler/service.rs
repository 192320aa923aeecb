//! Reconciler service implementation.
//!
//! A tick runs in four phases:
//! 1. Observe: fetch the status of every watched channel concurrently
//! 2. Decide: compute one [`Action`] per channel from the known state
//! 3. Execute: run the sink calls concurrently (distinct channels)
//! 4. Commit: apply the outcomes to the state map in one place, then
//!    publish the new snapshot
//!
//! The state map is only written in phase 4, and only by the tick holding
//! the state lock, so readers of the published snapshot never see a
//! half-applied tick. The phases run on their own task: a caller that stops
//! waiting cannot drop sink effects that were already executed.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::plan::{Action, Observation, decide};
use super::report::{EntityReport, TickReport, Transition};
use crate::domain::{LiveEntry, LiveStatus, NotificationHandle, ReconcilerSnapshot, StreamStatus};
use crate::monitor::{FetchError, StatusProvider};
use crate::notification::{NotificationRenderer, NotificationSink, SinkError};
use crate::watchlist::WatchlistManager;

/// Reconciler tunables.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Time between ticks.
    pub poll_interval: Duration,
    /// Minimum time between two edits of the same live notification.
    pub metadata_refresh_interval: Duration,
    /// Upper bound for every status fetch and sink call.
    pub request_timeout: Duration,
    /// Maximum concurrent fetches / sink calls within a tick.
    pub max_concurrent_requests: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            metadata_refresh_interval: Duration::from_secs(300),
            request_timeout: Duration::from_secs(10),
            max_concurrent_requests: 8,
        }
    }
}

#[derive(Default)]
struct TickState {
    entries: BTreeMap<String, LiveEntry>,
    ticks: u64,
}

/// Work item for one channel, produced by the decide phase.
struct Work {
    id: String,
    action: Action,
    current: Option<LiveEntry>,
    fetch_error: Option<FetchError>,
}

enum Outcome {
    Unchanged,
    Created {
        handle: NotificationHandle,
        status: LiveStatus,
        live_since: DateTime<Utc>,
    },
    Refreshed {
        status: LiveStatus,
    },
    Deleted,
    /// The notification vanished while we still tracked it.
    HandleInvalidated,
    Failed(SinkError),
}

/// Owns the known state of every live channel and converges the
/// notification channel towards the observed state.
pub struct Reconciler {
    provider: Arc<dyn StatusProvider>,
    sink: Arc<dyn NotificationSink>,
    watchlist: Arc<WatchlistManager>,
    renderer: NotificationRenderer,
    config: ReconcilerConfig,
    /// Held for the whole tick; `try_lock` failing means a tick is running.
    state: Mutex<TickState>,
    snapshot_tx: watch::Sender<Arc<ReconcilerSnapshot>>,
}

impl Reconciler {
    pub fn new(
        provider: Arc<dyn StatusProvider>,
        sink: Arc<dyn NotificationSink>,
        watchlist: Arc<WatchlistManager>,
        renderer: NotificationRenderer,
        config: ReconcilerConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(ReconcilerSnapshot::default()));

        Self {
            provider,
            sink,
            watchlist,
            renderer,
            config,
            state: Mutex::new(TickState::default()),
            snapshot_tx,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Subscribe to committed snapshots (one per completed tick).
    pub fn subscribe(&self) -> watch::Receiver<Arc<ReconcilerSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// The most recently committed snapshot.
    pub fn snapshot(&self) -> Arc<ReconcilerSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    /// Run one poll-diff-converge cycle.
    ///
    /// Returns a skipped report without doing anything if another tick is
    /// still in progress. The tick runs to completion even if the returned
    /// future is dropped.
    pub async fn tick(self: &Arc<Self>) -> TickReport {
        let this = Arc::clone(self);
        match tokio::spawn(async move { this.tick_inner().await }).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Tick task failed");
                TickReport::skipped()
            }
        }
    }

    async fn tick_inner(&self) -> TickReport {
        let Ok(mut state) = self.state.try_lock() else {
            debug!("Previous tick still running, skipping");
            return TickReport::skipped();
        };

        let started_at = Utc::now();
        let started = Instant::now();
        state.ticks += 1;
        let tick = state.ticks;
        let concurrency = self.config.max_concurrent_requests.max(1);

        // Observe
        let watched = self.watchlist.list();
        let unwatched: Vec<String> = state
            .entries
            .keys()
            .filter(|id| !watched.contains(*id))
            .cloned()
            .collect();

        let mut observations: Vec<(String, Observation)> = stream::iter(watched)
            .map(|id| async move {
                let observation = self.observe(&id).await;
                (id, observation)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        observations.extend(
            unwatched
                .into_iter()
                .map(|id| (id, Observation::Unwatched)),
        );

        // Decide
        let now = Instant::now();
        let work: Vec<Work> = observations
            .into_iter()
            .map(|(id, observation)| {
                let current = state.entries.get(&id).cloned();
                let action = decide(
                    current.as_ref(),
                    &observation,
                    now,
                    self.config.metadata_refresh_interval,
                );
                let fetch_error = match observation {
                    Observation::Unavailable(e) => Some(e),
                    _ => None,
                };
                Work {
                    id,
                    action,
                    current,
                    fetch_error,
                }
            })
            .collect();

        // Execute
        let rendered_at = Utc::now();
        let mut results: Vec<(Work, Outcome)> = stream::iter(work)
            .map(|work| async move {
                let outcome = self.execute(&work, rendered_at).await;
                (work, outcome)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        results.sort_by(|(a, _), (b, _)| a.id.cmp(&b.id));

        // Commit
        let mut entities = Vec::with_capacity(results.len());
        for (work, outcome) in results {
            entities.push(Self::commit(&mut state.entries, work, outcome));
        }

        let snapshot = ReconcilerSnapshot::new(state.entries.clone(), tick, Some(Utc::now()));
        self.snapshot_tx.send_replace(Arc::new(snapshot));

        TickReport {
            tick,
            skipped: false,
            started_at,
            duration: started.elapsed(),
            entities,
        }
    }

    /// Tick every `poll_interval` until cancelled. Ticks that fall due while
    /// one is still running are dropped, not queued.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(
            interval = ?self.config.poll_interval,
            refresh = ?self.config.metadata_refresh_interval,
            "Reconciler started"
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    log_report(&report);
                }
            }
        }

        debug!("Reconciler stopped");
    }

    /// Delete every tracked notification. Used on graceful shutdown so a
    /// restart (which starts with empty state) does not leave stale messages.
    ///
    /// Returns the number of notifications removed.
    pub async fn clear_notifications(&self) -> usize {
        let mut state = self.state.lock().await;

        let tracked: Vec<(String, NotificationHandle)> = state
            .entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.handle.clone()))
            .collect();

        let mut removed = 0;
        for (id, handle) in tracked {
            match self.sink_call(self.sink.delete(&handle)).await {
                Ok(()) | Err(SinkError::NotFound) => {
                    state.entries.remove(&id);
                    removed += 1;
                }
                Err(e) => warn!(channel = %id, error = %e, "Failed to remove notification"),
            }
        }

        let tick = state.ticks;
        self.snapshot_tx.send_replace(Arc::new(ReconcilerSnapshot::new(
            state.entries.clone(),
            tick,
            Some(Utc::now()),
        )));

        if removed > 0 {
            info!(count = removed, "Removed live notifications");
        }
        removed
    }

    async fn observe(&self, id: &str) -> Observation {
        let result =
            tokio::time::timeout(self.config.request_timeout, self.provider.fetch_status(id))
                .await
                .unwrap_or(Err(FetchError::Timeout(self.config.request_timeout)));

        match result {
            Ok(StreamStatus::Live(status)) => Observation::Live(status),
            Ok(StreamStatus::Offline) => Observation::Offline,
            Err(e) => {
                if e.is_persistent() {
                    error!(
                        channel = %id,
                        error = %e,
                        "Status check rejected, check credentials and channel id"
                    );
                } else {
                    warn!(channel = %id, error = %e, "Status check failed, keeping current state");
                }
                Observation::Unavailable(e)
            }
        }
    }

    async fn execute(&self, work: &Work, rendered_at: DateTime<Utc>) -> Outcome {
        match &work.action {
            Action::None => Outcome::Unchanged,

            Action::Create(status) => {
                let live_since = status.started_at.unwrap_or(rendered_at);
                let payload = self
                    .renderer
                    .render(&work.id, status, live_since, rendered_at);

                match self.sink_call(self.sink.create(&work.id, &payload)).await {
                    Ok(handle) => Outcome::Created {
                        handle,
                        status: status.clone(),
                        live_since,
                    },
                    Err(e) => Outcome::Failed(e),
                }
            }

            Action::Refresh(status) => {
                let Some(current) = &work.current else {
                    return Outcome::Unchanged;
                };
                let payload =
                    self.renderer
                        .render(&work.id, status, current.live_since, rendered_at);

                match self
                    .sink_call(self.sink.update(&current.handle, &payload))
                    .await
                {
                    Ok(()) => Outcome::Refreshed {
                        status: status.clone(),
                    },
                    Err(SinkError::NotFound) => Outcome::HandleInvalidated,
                    Err(e) => Outcome::Failed(e),
                }
            }

            Action::Delete => {
                let Some(current) = &work.current else {
                    return Outcome::Unchanged;
                };

                match self.sink_call(self.sink.delete(&current.handle)).await {
                    Ok(()) | Err(SinkError::NotFound) => Outcome::Deleted,
                    Err(e) => Outcome::Failed(e),
                }
            }
        }
    }

    async fn sink_call<T>(
        &self,
        call: impl Future<Output = Result<T, SinkError>>,
    ) -> Result<T, SinkError> {
        tokio::time::timeout(self.config.request_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(SinkError::Transport(format!(
                    "timed out after {:?}",
                    self.config.request_timeout
                )))
            })
    }

    fn commit(
        entries: &mut BTreeMap<String, LiveEntry>,
        work: Work,
        outcome: Outcome,
    ) -> EntityReport {
        let Work {
            id, fetch_error, ..
        } = work;

        match outcome {
            Outcome::Unchanged => match fetch_error {
                Some(e) => EntityReport::failed(id, e.to_string()),
                None => EntityReport::new(id, Transition::None),
            },

            Outcome::Created {
                handle,
                status,
                live_since,
            } => {
                info!(
                    channel = %id,
                    title = %status.title,
                    message_id = %handle,
                    "Channel went LIVE, notification posted"
                );
                entries.insert(
                    id.clone(),
                    LiveEntry {
                        status,
                        handle,
                        live_since,
                        last_metadata_refresh: Instant::now(),
                    },
                );
                EntityReport::new(id, Transition::WentLive)
            }

            Outcome::Refreshed { status } => {
                debug!(channel = %id, title = %status.title, "Notification refreshed");
                if let Some(entry) = entries.get_mut(&id) {
                    entry.status = status;
                    entry.last_metadata_refresh = Instant::now();
                }
                EntityReport::new(id, Transition::Refreshed)
            }

            Outcome::Deleted => {
                info!(channel = %id, "Channel went OFFLINE, notification removed");
                entries.remove(&id);
                EntityReport::new(id, Transition::WentOffline)
            }

            Outcome::HandleInvalidated => {
                info!(
                    channel = %id,
                    "Notification was deleted externally, it will be posted again"
                );
                entries.remove(&id);
                EntityReport::new(id, Transition::None)
            }

            Outcome::Failed(e) => {
                warn!(channel = %id, error = %e, "Notification update failed, retrying next tick");
                EntityReport::failed(id, e.to_string())
            }
        }
    }
}

fn log_report(report: &TickReport) {
    if report.skipped {
        return;
    }

    let went_live = report.count(Transition::WentLive);
    let went_offline = report.count(Transition::WentOffline);
    let refreshed = report.count(Transition::Refreshed);
    let errors = report.error_count();

    if went_live + went_offline + errors > 0 {
        info!(
            tick = report.tick,
            checked = report.entities.len(),
            went_live,
            went_offline,
            refreshed,
            errors,
            duration = ?report.duration,
            "Tick completed"
        );
    } else {
        debug!(
            tick = report.tick,
            checked = report.entities.len(),
            refreshed,
            duration = ?report.duration,
            "Tick completed"
        );
    }
}
