//! Discord webhook notification sink.
//!
//! Messages are created with `?wait=true` so Discord returns the message id,
//! which is then used to edit (`PATCH`) and delete (`DELETE`) the message
//! through `<webhook>/messages/<id>`.
//!
//! Rate limits follow Discord's recommendation:
//! - No hardcoded rate limits
//! - Retries on 429 responses respecting `Retry-After`
//!   (falling back to `X-RateLimit-Reset-After`)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use super::sink::{NotificationPayload, NotificationSink, SinkError};
use crate::Result;
use crate::domain::NotificationHandle;

/// Maximum number of retries for rate-limited requests, on top of the
/// first attempt.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Discord webhook configuration.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Discord webhook URL (`https://discord.com/api/webhooks/<id>/<token>`).
    pub webhook_url: String,
    /// Optional username override for posted messages.
    pub username: Option<String>,
    /// Optional avatar URL override for posted messages.
    pub avatar_url: Option<String>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // the webhook token is a credential
        f.debug_struct("DiscordConfig")
            .field("webhook_url", &"<redacted>")
            .field("username", &self.username)
            .field("avatar_url", &self.avatar_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
}

/// Notification sink posting embeds through a Discord webhook.
pub struct DiscordWebhookSink {
    config: DiscordConfig,
    webhook_url: Url,
    client: Client,
}

impl DiscordWebhookSink {
    pub fn new(config: DiscordConfig, client: Client) -> Result<Self> {
        let webhook_url = Url::parse(config.webhook_url.trim())
            .map_err(|e| crate::Error::config(format!("invalid Discord webhook URL: {e}")))?;
        if webhook_url.cannot_be_a_base() {
            return Err(crate::Error::config("invalid Discord webhook URL"));
        }

        Ok(Self {
            config,
            webhook_url,
            client,
        })
    }

    /// Webhook body for a payload. Username/avatar overrides are only
    /// accepted when creating a message, not on edits.
    fn build_body(&self, payload: &NotificationPayload, creating: bool) -> serde_json::Value {
        let mut embed = json!({
            "title": payload.headline_text,
            "url": payload.link_url,
            "description": payload.description_text,
            "color": payload.accent_color,
            "footer": { "text": payload.footer_text },
        });
        if let Some(thumbnail) = &payload.thumbnail_image_ref {
            embed["thumbnail"] = json!({ "url": thumbnail });
        }
        if let Some(banner) = &payload.banner_image_ref {
            embed["image"] = json!({ "url": banner });
        }
        if let Some(timestamp) = payload.timestamp {
            embed["timestamp"] = json!(timestamp.to_rfc3339());
        }

        let mut body = json!({ "embeds": [embed] });
        if let Some(content) = &payload.content {
            body["content"] = json!(content);
        }

        if creating {
            if let Some(username) = &self.config.username {
                body["username"] = json!(username);
            }
            if let Some(avatar_url) = &self.config.avatar_url {
                body["avatar_url"] = json!(avatar_url);
            }
        }

        body
    }

    fn create_url(&self) -> Url {
        let mut url = self.webhook_url.clone();
        url.query_pairs_mut().append_pair("wait", "true");
        url
    }

    fn message_url(&self, handle: &NotificationHandle) -> std::result::Result<Url, SinkError> {
        let mut url = self.webhook_url.clone();
        url.path_segments_mut()
            .map_err(|_| SinkError::Transport("webhook URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("messages")
            .push(handle.as_str());
        Ok(url)
    }

    /// Send a request, retrying 429 responses up to [`MAX_RATE_LIMIT_RETRIES`] times.
    async fn send_with_retry<F>(&self, build: F) -> std::result::Result<Response, SinkError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;

        loop {
            let response = build()
                .send()
                .await
                .map_err(|e| SinkError::Transport(format!("Discord request failed: {}", e)))?;

            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::NOT_FOUND {
                return Err(SinkError::NotFound);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = retry_after(response.headers());

                if retries >= MAX_RATE_LIMIT_RETRIES {
                    warn!(
                        "Discord rate limit: max retries ({}) exceeded, last retry_after was {:?}",
                        MAX_RATE_LIMIT_RETRIES, retry_after
                    );
                    return Err(SinkError::Transport(format!(
                        "Discord rate limit exceeded after {} retries",
                        MAX_RATE_LIMIT_RETRIES
                    )));
                }

                retries += 1;
                let wait_duration = retry_after.unwrap_or(Duration::from_secs(1));
                debug!(
                    "Discord rate limited (429), waiting {:?} before retry {}/{}",
                    wait_duration, retries, MAX_RATE_LIMIT_RETRIES
                );
                tokio::time::sleep(wait_duration).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            warn!("Discord webhook failed: {} - {}", status, body);
            return Err(SinkError::Transport(format!(
                "Discord webhook failed: {} - {}",
                status, body
            )));
        }
    }
}

/// Retry delay of a 429 response.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    ["Retry-After", "X-RateLimit-Reset-After"]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok()?.trim().parse::<f64>().ok())
        .find(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

#[async_trait]
impl NotificationSink for DiscordWebhookSink {
    async fn create(
        &self,
        id: &str,
        payload: &NotificationPayload,
    ) -> std::result::Result<NotificationHandle, SinkError> {
        let body = self.build_body(payload, true);
        let url = self.create_url();

        let response = self
            .send_with_retry(|| self.client.post(url.clone()).json(&body))
            .await?;

        let message: MessageResponse = response.json().await.map_err(|e| {
            SinkError::Transport(format!("Discord returned an unreadable message: {}", e))
        })?;

        debug!(channel = %id, message_id = %message.id, "Discord notification created");
        Ok(NotificationHandle::new(message.id))
    }

    async fn update(
        &self,
        handle: &NotificationHandle,
        payload: &NotificationPayload,
    ) -> std::result::Result<(), SinkError> {
        let body = self.build_body(payload, false);
        let url = self.message_url(handle)?;

        self.send_with_retry(|| self.client.patch(url.clone()).json(&body))
            .await?;

        debug!(message_id = %handle, "Discord notification updated");
        Ok(())
    }

    async fn delete(&self, handle: &NotificationHandle) -> std::result::Result<(), SinkError> {
        let url = self.message_url(handle)?;

        match self.send_with_retry(|| self.client.delete(url.clone())).await {
            Ok(_) => {
                debug!(message_id = %handle, "Discord notification deleted");
                Ok(())
            }
            Err(SinkError::NotFound) => {
                debug!(message_id = %handle, "Discord notification was already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
