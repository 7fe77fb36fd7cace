use url::Url;

const MAX_LOGIN_LEN: usize = 25;

/// Turns user input (`Foo`, `@foo`, `twitch.tv/foo`, `https://www.twitch.tv/foo/videos`)
/// into a lowercase Twitch login. Returns `None` if the result is not a valid
/// login.
pub fn normalize_channel_name(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let candidate = if trimmed.contains("twitch.tv/") {
        login_from_url(trimmed)?
    } else {
        trimmed.trim_start_matches('@').to_string()
    };

    let login = candidate.to_lowercase();
    if is_valid_login(&login) {
        Some(login)
    } else {
        None
    }
}

fn login_from_url(input: &str) -> Option<String> {
    let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?;
    if host != "twitch.tv" && !host.ends_with(".twitch.tv") {
        return None;
    }

    url.path_segments()?
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

pub fn is_valid_login(login: &str) -> bool {
    !login.is_empty()
        && login.len() <= MAX_LOGIN_LEN
        && login
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_plain_names() {
        assert_eq!(normalize_channel_name("Foo_Bar"), Some("foo_bar".to_string()));
        assert_eq!(normalize_channel_name("  @shroud "), Some("shroud".to_string()));
    }

    #[test]
    fn extracts_login_from_urls() {
        assert_eq!(normalize_channel_name("https://www.twitch.tv/Pokimane"), Some("pokimane".to_string()));
        assert_eq!(normalize_channel_name("twitch.tv/xqc/videos"), Some("xqc".to_string()));
        assert_eq!(normalize_channel_name("https://m.twitch.tv/ninja?ref=share"), Some("ninja".to_string()));
        assert_eq!(normalize_channel_name("https://example.com/twitch.tv/foo"), None);
    }

    #[test]
    fn rejects_invalid_logins() {
        assert_eq!(normalize_channel_name(""), None);
        assert_eq!(normalize_channel_name("@"), None);
        assert_eq!(normalize_channel_name("has space"), None);
        assert_eq!(normalize_channel_name("dash-name"), None);
        assert_eq!(normalize_channel_name(&"a".repeat(26)), None);
        assert_eq!(normalize_channel_name("кириллица"), None);
    }
}
