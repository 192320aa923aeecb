//! Per-channel transition decisions.
//!
//! `decide` is pure: it only looks at the known entry, this tick's
//! observation and the clock, so every row of the state table can be tested
//! without I/O.

use std::time::Duration;

use tokio::time::Instant;

use crate::domain::{LiveEntry, LiveStatus};
use crate::monitor::FetchError;

/// What a tick learned about one channel.
#[derive(Debug, Clone)]
pub enum Observation {
    Live(LiveStatus),
    Offline,
    /// The lookup failed; nothing is known about the channel this tick.
    Unavailable(FetchError),
    /// The channel is no longer in the watchlist. Not fetched.
    Unwatched,
}

/// Side effect to perform for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Create(LiveStatus),
    Refresh(LiveStatus),
    Delete,
}

pub fn decide(
    current: Option<&LiveEntry>,
    observation: &Observation,
    now: Instant,
    refresh_interval: Duration,
) -> Action {
    match (current, observation) {
        // no observation never implies offline
        (_, Observation::Unavailable(_)) => Action::None,

        (None, Observation::Live(status)) => Action::Create(status.clone()),
        (None, Observation::Offline | Observation::Unwatched) => Action::None,

        (Some(entry), Observation::Live(status)) => {
            if now.saturating_duration_since(entry.last_metadata_refresh) >= refresh_interval {
                Action::Refresh(status.clone())
            } else {
                Action::None
            }
        }
        (Some(_), Observation::Offline | Observation::Unwatched) => Action::Delete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{live_entry, live_status};

    const REFRESH: Duration = Duration::from_secs(300);

    fn live() -> Observation {
        Observation::Live(live_status("Alice", "T2"))
    }

    fn unavailable() -> Observation {
        Observation::Unavailable(FetchError::Network("connection reset".to_string()))
    }

    #[test]
    fn test_absent_channel() {
        let now = Instant::now();

        assert_eq!(
            decide(None, &live(), now, REFRESH),
            Action::Create(live_status("Alice", "T2"))
        );
        assert_eq!(decide(None, &Observation::Offline, now, REFRESH), Action::None);
        assert_eq!(decide(None, &unavailable(), now, REFRESH), Action::None);
        assert_eq!(decide(None, &Observation::Unwatched, now, REFRESH), Action::None);
    }

    #[test]
    fn test_live_channel_refresh_is_gated() {
        let entry = live_entry("Alice", "T1", "m1");
        let refreshed_at = entry.last_metadata_refresh;

        assert_eq!(
            decide(Some(&entry), &live(), refreshed_at + Duration::from_secs(10), REFRESH),
            Action::None
        );
        assert_eq!(
            decide(Some(&entry), &live(), refreshed_at + REFRESH, REFRESH),
            Action::Refresh(live_status("Alice", "T2"))
        );
    }

    #[test]
    fn test_live_channel_going_away() {
        let entry = live_entry("Alice", "T1", "m1");
        let now = Instant::now();

        assert_eq!(
            decide(Some(&entry), &Observation::Offline, now, REFRESH),
            Action::Delete
        );
        assert_eq!(
            decide(Some(&entry), &Observation::Unwatched, now, REFRESH),
            Action::Delete
        );
    }

    #[test]
    fn test_fetch_failure_keeps_live_channel() {
        let entry = live_entry("Alice", "T1", "m1");
        let much_later = entry.last_metadata_refresh + REFRESH * 10;

        assert_eq!(
            decide(Some(&entry), &unavailable(), much_later, REFRESH),
            Action::None
        );
    }
}
