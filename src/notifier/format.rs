use crate::telegram::html::escape_html;
use crate::twitch::api::StreamInfo;

const PREVIEW_WIDTH: u32 = 1280;
const PREVIEW_HEIGHT: u32 = 720;

// Telegram caps photo captions at 1024 characters.
const MAX_TITLE_CHARS: usize = 200;

/// A rendered "channel went live" message.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamNotification {
    pub channel_name: String,
    pub session_id: String,
    /// HTML caption.
    pub caption: String,
    pub preview_url: Option<String>,
}

pub fn format_notification(stream: &StreamInfo) -> StreamNotification {
    let title = if stream.title.trim().is_empty() {
        "Untitled stream".to_string()
    } else {
        truncate(stream.title.trim(), MAX_TITLE_CHARS)
    };

    let mut caption = format!(
        "🔴 <b>{}</b> is live on Twitch!\n\n{}\n",
        escape_html(&stream.user_name),
        escape_html(&title)
    );
    if !stream.game_name.is_empty() {
        caption.push_str(&format!("🎮 {}\n", escape_html(&stream.game_name)));
    }
    caption.push_str(&format!("\n<a href=\"{}\">Watch the stream</a>", stream.channel_url()));

    // Twitch reuses the preview URL across broadcasts; the session id keeps
    // Telegram from serving a cached image of an earlier one.
    let preview_url = if stream.thumbnail_url.is_empty() {
        None
    } else {
        Some(format!(
            "{}?session={}",
            stream.thumbnail(PREVIEW_WIDTH, PREVIEW_HEIGHT),
            stream.id
        ))
    };

    StreamNotification {
        channel_name: stream.user_login.clone(),
        session_id: stream.id.clone(),
        caption,
        preview_url,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars - 1).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stream(title: &str, game: &str, thumbnail: &str) -> StreamInfo {
        StreamInfo {
            id: "s1".to_string(),
            user_id: "1".to_string(),
            user_login: "foo".to_string(),
            user_name: "Foo".to_string(),
            game_name: game.to_string(),
            title: title.to_string(),
            viewer_count: 10,
            started_at: Utc::now(),
            thumbnail_url: thumbnail.to_string(),
        }
    }

    #[test]
    fn includes_channel_title_game_and_preview() {
        let notification = format_notification(&stream(
            "Speedrun <any%> & chill",
            "Celeste",
            "https://cdn/live_user_foo-{width}x{height}.jpg",
        ));

        assert!(notification.caption.contains("<b>Foo</b> is live"));
        assert!(notification.caption.contains("Speedrun &lt;any%&gt; &amp; chill"));
        assert!(notification.caption.contains("🎮 Celeste"));
        assert!(notification.caption.contains("https://twitch.tv/foo"));
        assert_eq!(
            notification.preview_url.as_deref(),
            Some("https://cdn/live_user_foo-1280x720.jpg?session=s1")
        );
        assert_eq!(notification.channel_name, "foo");
    }

    #[test]
    fn handles_missing_fields() {
        let notification = format_notification(&stream("  ", "", ""));

        assert!(notification.caption.contains("Untitled stream"));
        assert!(!notification.caption.contains("🎮"));
        assert!(notification.preview_url.is_none());
    }

    #[test]
    fn truncates_long_titles() {
        let long_title = "x".repeat(500);
        let notification = format_notification(&stream(&long_title, "", ""));

        assert!(notification.caption.contains(&format!("{}…", "x".repeat(MAX_TITLE_CHARS - 1))));
        assert!(notification.caption.chars().count() < 1024);
    }
}
