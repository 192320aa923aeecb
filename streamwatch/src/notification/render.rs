//! Rendering of live notifications.

use chrono::{DateTime, Utc};

use super::sink::NotificationPayload;
use crate::domain::LiveStatus;

/// Red, the accent the announcement embeds have always used.
pub const DEFAULT_ACCENT_COLOR: u32 = 0xFF0000;

/// Embed titles are capped at 256 characters by Discord.
const MAX_HEADLINE_CHARS: usize = 256;

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Mention prepended to the message text (e.g. `@everyone`).
    pub mention: Option<String>,
    /// Base URL the channel id is appended to for the link.
    pub channel_base_url: String,
    pub accent_color: u32,
    pub footer_text: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mention: None,
            channel_base_url: "https://twitch.tv/".to_string(),
            accent_color: DEFAULT_ACCENT_COLOR,
            footer_text: "Click the title to watch the stream".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotificationRenderer {
    config: RenderConfig,
}

impl NotificationRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render the notification for `id`.
    ///
    /// `rendered_at` is appended to the preview URL so chat clients fetch a
    /// fresh preview after every edit instead of serving a cached one.
    pub fn render(
        &self,
        id: &str,
        status: &LiveStatus,
        live_since: DateTime<Utc>,
        rendered_at: DateTime<Utc>,
    ) -> NotificationPayload {
        let name = &status.display_name;

        let content = match self.config.mention.as_deref().map(str::trim) {
            Some(mention) if !mention.is_empty() => format!("🔴 {mention} {name} is live!"),
            _ => format!("🔴 {name} is live!"),
        };

        let mut description = format!("**Title**: {}", status.title);
        if let Some(category) = &status.category {
            description.push_str(&format!("\n**Category**: {category}"));
        }
        if let Some(viewers) = status.viewer_count {
            description.push_str(&format!("\n**Viewers**: {viewers}"));
        }

        NotificationPayload {
            content: Some(content),
            headline_text: truncate_chars(
                &format!("{name} is live on Twitch!"),
                MAX_HEADLINE_CHARS,
            ),
            link_url: format!(
                "{}{}",
                self.config.channel_base_url,
                id.trim_start_matches('/')
            ),
            description_text: description,
            thumbnail_image_ref: status.profile_image_url.clone(),
            banner_image_ref: status
                .thumbnail_url
                .as_deref()
                .map(|url| cache_busted(url, rendered_at)),
            accent_color: self.config.accent_color,
            footer_text: self.config.footer_text.clone(),
            timestamp: Some(live_since),
        }
    }
}

fn cache_busted(url: &str, at: DateTime<Utc>) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={}", at.timestamp())
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
