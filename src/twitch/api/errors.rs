use thiserror::Error;

/// A failed lookup against the Twitch API. Always scoped to one request.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Twitch rejected the app credentials: {0}")]
    Auth(String),

    #[error("Rate limited by Twitch (reset at {reset_at:?})")]
    RateLimited { reset_at: Option<i64> },

    #[error("Twitch API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response from Twitch: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LookupError::Timeout
        } else if err.is_decode() {
            LookupError::Decode(err.to_string())
        } else {
            LookupError::Http(err)
        }
    }
}
