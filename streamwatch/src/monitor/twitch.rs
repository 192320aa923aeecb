//! Twitch status lookups through Helix.

use async_trait::async_trait;
use tracing::{debug, warn};
use twitch_helix::{HelixClient, Stream, User};

use super::provider::{FetchError, StatusProvider};
use crate::domain::{LiveStatus, StreamStatus};

/// Preview size substituted into the Helix thumbnail template.
pub const PREVIEW_WIDTH: u32 = 1280;
pub const PREVIEW_HEIGHT: u32 = 720;

/// Status provider backed by the Helix `streams` and `users` endpoints.
pub struct HelixStatusProvider {
    client: HelixClient,
}

impl HelixStatusProvider {
    pub fn new(client: HelixClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusProvider for HelixStatusProvider {
    async fn fetch_status(&self, id: &str) -> Result<StreamStatus, FetchError> {
        debug!(channel = %id, "Checking stream status");

        let Some(stream) = self.client.get_stream(id).await? else {
            debug!(channel = %id, "Channel is OFFLINE");
            return Ok(StreamStatus::Offline);
        };

        // The avatar is only needed for rendering, so only live channels pay for it.
        let user = self.client.get_user(id).await?;
        if user.is_none() {
            warn!(channel = %id, "Live channel has no user record");
        }

        let status = live_status_from(stream, user.as_ref());
        debug!(
            channel = %id,
            title = %status.title,
            category = ?status.category,
            viewers = ?status.viewer_count,
            "Channel is LIVE"
        );
        Ok(StreamStatus::Live(status))
    }
}

fn live_status_from(stream: Stream, user: Option<&User>) -> LiveStatus {
    let thumbnail_url = Some(stream.thumbnail(PREVIEW_WIDTH, PREVIEW_HEIGHT))
        .filter(|url| !url.is_empty());
    let profile_image_url = user
        .map(|user| user.profile_image_url.clone())
        .filter(|url| !url.is_empty());
    let display_name = if stream.user_name.is_empty() {
        stream.user_login.clone()
    } else {
        stream.user_name.clone()
    };

    LiveStatus {
        display_name,
        title: stream.title,
        category: Some(stream.game_name).filter(|name| !name.is_empty()),
        viewer_count: Some(stream.viewer_count),
        thumbnail_url,
        profile_image_url,
        started_at: stream.started_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(game_name: &str, thumbnail_url: &str) -> Stream {
        Stream {
            id: "1".to_string(),
            user_id: "10".to_string(),
            user_login: "alice".to_string(),
            user_name: "Alice".to_string(),
            game_name: game_name.to_string(),
            kind: "live".to_string(),
            title: "T1".to_string(),
            viewer_count: 12,
            started_at: None,
            thumbnail_url: thumbnail_url.to_string(),
        }
    }

    #[test]
    fn test_live_status_from_stream_and_user() {
        let user = User {
            id: "10".to_string(),
            login: "alice".to_string(),
            display_name: "Alice".to_string(),
            profile_image_url: "https://example.com/alice.png".to_string(),
            offline_image_url: String::new(),
        };

        let status = live_status_from(
            stream("Chess", "https://example.com/live_alice-{width}x{height}.jpg"),
            Some(&user),
        );

        assert_eq!(status.display_name, "Alice");
        assert_eq!(status.title, "T1");
        assert_eq!(status.category.as_deref(), Some("Chess"));
        assert_eq!(status.viewer_count, Some(12));
        assert_eq!(
            status.thumbnail_url.as_deref(),
            Some("https://example.com/live_alice-1280x720.jpg")
        );
        assert_eq!(
            status.profile_image_url.as_deref(),
            Some("https://example.com/alice.png")
        );
    }

    #[test]
    fn test_live_status_from_sparse_stream() {
        let status = live_status_from(stream("", ""), None);

        assert_eq!(status.category, None);
        assert_eq!(status.thumbnail_url, None);
        assert_eq!(status.profile_image_url, None);
    }
}
