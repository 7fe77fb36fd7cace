use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Unexpected response from Telegram: {0}")]
    Decode(String),
}

impl TelegramError {
    /// The user blocked the bot or deleted their account.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, TelegramError::Api { code: 403, .. })
    }
}

// The request URL carries the bot token, so it is stripped before the error
// can reach a log line.
impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            TelegramError::Timeout
        } else if err.is_decode() {
            TelegramError::Decode(err.to_string())
        } else {
            TelegramError::Http(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_means_blocked_by_user() {
        let blocked = TelegramError::Api {
            code: 403,
            description: "Forbidden: bot was blocked by the user".to_string(),
        };
        let bad_request = TelegramError::Api {
            code: 400,
            description: "Bad Request: chat not found".to_string(),
        };

        assert!(blocked.is_forbidden());
        assert!(!bad_request.is_forbidden());
        assert!(!TelegramError::Timeout.is_forbidden());
    }
}
