//! Notification side: rendering a live channel into a message and the sink
//! that creates, edits and deletes that message.
//!
//! - [`NotificationSink`] is the boundary the reconciler talks to
//! - [`DiscordWebhookSink`] posts embeds through a Discord webhook
//! - [`NotificationRenderer`] turns a [`crate::domain::LiveStatus`] into a payload

mod discord;
mod render;
mod sink;

pub use discord::{DiscordConfig, DiscordWebhookSink};
pub use render::{DEFAULT_ACCENT_COLOR, NotificationRenderer, RenderConfig};
pub use sink::{NotificationPayload, NotificationSink, SinkError};
