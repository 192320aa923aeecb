//! Request and response bodies of the admin API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub watched: usize,
    pub live: usize,
    /// Ticks completed since startup.
    pub ticks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tick_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct WatchlistResponse {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AddChannelResponse {
    pub id: String,
    pub added: bool,
}

#[derive(Debug, Serialize)]
pub struct RemoveChannelResponse {
    pub id: String,
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct LiveChannel {
    pub id: String,
    pub display_name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_count: Option<u64>,
    pub live_since: DateTime<Utc>,
    pub message_id: String,
}

#[derive(Debug, Serialize)]
pub struct LiveResponse {
    pub tick: u64,
    pub channels: Vec<LiveChannel>,
}

#[derive(Debug, Serialize)]
pub struct LoggingConfigResponse {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLogFilterRequest {
    pub filter: String,
}
