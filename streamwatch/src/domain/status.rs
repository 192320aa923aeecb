//! Observed status of a watched channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of a channel that is currently broadcasting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStatus {
    /// Display name as shown by the platform (casing preserved).
    pub display_name: String,
    /// Stream title.
    pub title: String,
    /// Stream category / game (if available).
    pub category: Option<String>,
    /// Viewer count (if available).
    pub viewer_count: Option<u64>,
    /// Preview image with the size placeholders already substituted.
    pub thumbnail_url: Option<String>,
    /// Channel avatar.
    pub profile_image_url: Option<String>,
    /// Broadcast start time reported by the platform.
    pub started_at: Option<DateTime<Utc>>,
}

/// Result of a successful status lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamStatus {
    Live(LiveStatus),
    Offline,
}

impl StreamStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, StreamStatus::Live(_))
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            StreamStatus::Live(status) => Some(&status.title),
            StreamStatus::Offline => None,
        }
    }
}
