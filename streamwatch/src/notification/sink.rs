use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::NotificationHandle;

/// A rendered notification, independent of the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    /// Plain message text above the embed (mentions go here).
    pub content: Option<String>,
    pub headline_text: String,
    pub link_url: String,
    pub description_text: String,
    /// Small image (channel avatar).
    pub thumbnail_image_ref: Option<String>,
    /// Large image (stream preview).
    pub banner_image_ref: Option<String>,
    pub accent_color: u32,
    pub footer_text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The referenced message no longer exists.
    #[error("notification not found")]
    NotFound,
    /// The request did not go through; the effect is unknown or absent.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Executes notification side effects. Holds no per-channel state.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Post a new notification for `id`.
    async fn create(
        &self,
        id: &str,
        payload: &NotificationPayload,
    ) -> Result<NotificationHandle, SinkError>;

    /// Replace the content of an existing notification.
    async fn update(
        &self,
        handle: &NotificationHandle,
        payload: &NotificationPayload,
    ) -> Result<(), SinkError>;

    /// Remove a notification. `NotFound` means it is already gone.
    async fn delete(&self, handle: &NotificationHandle) -> Result<(), SinkError>;
}
