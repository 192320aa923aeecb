use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope shared by every Helix collection response.
#[derive(Debug, Clone, Deserialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

/// A live stream as returned by `GET /helix/streams`.
///
/// Helix only returns an entry while the channel is live, so an empty
/// `data` array means offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stream {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewer_count: u64,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub thumbnail_url: String,
}

impl Stream {
    /// Helix marks an active broadcast with `type == "live"`; an empty type
    /// is what the API returns on errors.
    pub fn is_live(&self) -> bool {
        self.kind == "live"
    }

    /// Thumbnail URL with the `{width}`/`{height}` placeholders filled in.
    pub fn thumbnail(&self, width: u32, height: u32) -> String {
        fill_thumbnail_template(&self.thumbnail_url, width, height)
    }
}

/// A user as returned by `GET /helix/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    pub offline_image_url: String,
}

/// Substitute the size placeholders of a Helix thumbnail template.
pub fn fill_thumbnail_template(template: &str, width: u32, height: u32) -> String {
    template
        .replace("{width}", &width.to_string())
        .replace("{height}", &height.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAMS_BODY: &str = r#"{
        "data": [{
            "id": "40952121085",
            "user_id": "101051819",
            "user_login": "afro",
            "user_name": "Afro",
            "game_id": "32982",
            "game_name": "Grand Theft Auto V",
            "type": "live",
            "title": "Jacob: Digital Den Laptops & Routers",
            "viewer_count": 1490,
            "started_at": "2021-03-10T03:18:11Z",
            "language": "en",
            "thumbnail_url": "https://static-cdn.jtvnw.net/previews-ttv/live_user_afro-{width}x{height}.jpg",
            "tag_ids": [],
            "is_mature": false
        }],
        "pagination": {}
    }"#;

    #[test]
    fn test_parse_streams_response() {
        let parsed: DataResponse<Stream> = serde_json::from_str(STREAMS_BODY).unwrap();
        assert_eq!(parsed.data.len(), 1);

        let stream = &parsed.data[0];
        assert!(stream.is_live());
        assert_eq!(stream.user_name, "Afro");
        assert_eq!(stream.game_name, "Grand Theft Auto V");
        assert_eq!(stream.viewer_count, 1490);
        assert!(stream.started_at.is_some());
        assert_eq!(
            stream.thumbnail(1280, 720),
            "https://static-cdn.jtvnw.net/previews-ttv/live_user_afro-1280x720.jpg"
        );
    }

    #[test]
    fn test_parse_empty_streams_response() {
        let parsed: DataResponse<Stream> =
            serde_json::from_str(r#"{"data": [], "pagination": {}}"#).unwrap();
        assert!(parsed.data.is_empty());
    }

    #[test]
    fn test_parse_user_response() {
        let body = r#"{"data": [{
            "id": "141981764",
            "login": "twitchdev",
            "display_name": "TwitchDev",
            "type": "",
            "broadcaster_type": "partner",
            "description": "Supporting third-party developers",
            "profile_image_url": "https://static-cdn.jtvnw.net/jtv_user_pictures/profile.png",
            "offline_image_url": "https://static-cdn.jtvnw.net/jtv_user_pictures/offline.png",
            "view_count": 5980557,
            "created_at": "2016-12-14T20:32:28Z"
        }]}"#;
        let parsed: DataResponse<User> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].display_name, "TwitchDev");
        assert!(parsed.data[0].profile_image_url.ends_with("profile.png"));
    }

    #[test]
    fn test_fill_template_without_placeholders() {
        assert_eq!(
            fill_thumbnail_template("https://example.com/a.jpg", 1, 2),
            "https://example.com/a.jpg"
        );
    }
}
