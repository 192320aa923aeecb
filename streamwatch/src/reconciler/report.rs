//! Tick reports.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// State change applied to one channel during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    None,
    WentLive,
    WentOffline,
    Refreshed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub id: String,
    pub transition: Transition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntityReport {
    pub fn new(id: impl Into<String>, transition: Transition) -> Self {
        Self {
            id: id.into(),
            transition,
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transition: Transition::None,
            error: Some(error.into()),
        }
    }
}

/// Outcome of one `tick()` call.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    /// Sequence number of the tick; 0 when skipped.
    pub tick: u64,
    /// Another tick was still running, nothing was done.
    pub skipped: bool,
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub entities: Vec<EntityReport>,
}

impl TickReport {
    pub fn skipped() -> Self {
        Self {
            tick: 0,
            skipped: true,
            started_at: Utc::now(),
            duration: Duration::ZERO,
            entities: Vec::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&EntityReport> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn count(&self, transition: Transition) -> usize {
        self.entities
            .iter()
            .filter(|entity| entity.transition == transition)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|entity| entity.error.is_some())
            .count()
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let report = TickReport {
            tick: 3,
            skipped: false,
            started_at: Utc::now(),
            duration: Duration::from_millis(12),
            entities: vec![
                EntityReport::new("alice", Transition::WentLive),
                EntityReport::new("bob", Transition::None),
                EntityReport::failed("carol", "timed out"),
            ],
        };

        assert_eq!(report.count(Transition::WentLive), 1);
        assert_eq!(report.count(Transition::None), 2);
        assert_eq!(report.error_count(), 1);
        assert_eq!(
            report.get("carol").and_then(|e| e.error.as_deref()),
            Some("timed out")
        );
    }

    #[test]
    fn test_report_serialization() {
        let report = TickReport {
            tick: 1,
            skipped: false,
            started_at: Utc::now(),
            duration: Duration::from_millis(1500),
            entities: vec![EntityReport::new("alice", Transition::WentOffline)],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["duration"], 1500);
        assert_eq!(json["entities"][0]["transition"], "went_offline");
        assert!(json["entities"][0].get("error").is_none());
    }
}
