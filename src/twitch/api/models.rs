use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope used by every Helix endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct HelixResponse<T> {
    pub data: Vec<T>,
}

/// One live broadcast as reported by `GET /helix/streams`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Session id; stable for the whole broadcast.
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewer_count: u64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub thumbnail_url: String,
}

impl StreamInfo {
    /// Resolves the `{width}x{height}` placeholders of the preview template.
    pub fn thumbnail(&self, width: u32, height: u32) -> String {
        self.thumbnail_url
            .replace("{width}", &width.to_string())
            .replace("{height}", &height.to_string())
    }

    pub fn channel_url(&self) -> String {
        format!("https://twitch.tv/{}", self.user_login)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitchUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppAccessToken {
    pub access_token: String,
    pub expires_in: u64,
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
            "title": "Jacob: Digital Den Laptops & Routers | NoPixel | !MAINGEAR !FCF",
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
    fn parses_helix_streams_response() {
        let response: HelixResponse<StreamInfo> = serde_json::from_str(STREAMS_BODY).unwrap();
        let stream = &response.data[0];

        assert_eq!(stream.id, "40952121085");
        assert_eq!(stream.user_name, "Afro");
        assert_eq!(stream.viewer_count, 1490);
        assert_eq!(
            stream.thumbnail(1280, 720),
            "https://static-cdn.jtvnw.net/previews-ttv/live_user_afro-1280x720.jpg"
        );
        assert_eq!(stream.channel_url(), "https://twitch.tv/afro");
    }

    #[test]
    fn offline_channel_has_empty_data() {
        let response: HelixResponse<StreamInfo> =
            serde_json::from_str(r#"{"data": [], "pagination": {}}"#).unwrap();
        assert!(response.data.is_empty());
    }

    #[test]
    fn parses_helix_users_response() {
        let body = r#"{"data": [{
            "id": "141981764",
            "login": "twitchdev",
            "display_name": "TwitchDev",
            "type": "",
            "broadcaster_type": "partner",
            "description": "Supporting third-party developers",
            "profile_image_url": "https://static-cdn.jtvnw.net/jtv_user_pictures/8a6381c7.png",
            "created_at": "2016-12-14T20:32:28Z"
        }]}"#;

        let response: HelixResponse<TwitchUser> = serde_json::from_str(body).unwrap();
        assert_eq!(response.data[0].login, "twitchdev");
        assert_eq!(response.data[0].display_name, "TwitchDev");
    }
}
