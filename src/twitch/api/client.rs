use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::notifier::StreamStatusSource;
use crate::twitch::api::models::{AppAccessToken, HelixResponse};
use crate::twitch::api::requests;
use crate::twitch::api::{LookupError, StreamInfo, TwitchUser};

const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";
const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

// Refresh a little before Twitch would reject the token.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN
    }
}

/// Helix client authenticated with an app access token (client credentials
/// grant). The token is cached and renewed on expiry or after a 401.
pub struct TwitchAPIClient {
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
    client: Client,
}

impl TwitchAPIClient {
    pub fn new(client_id: &str, client_secret: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(TwitchAPIClient {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token: Mutex::new(None),
            client,
        })
    }

    /// Fetches a token eagerly so bad credentials fail at startup.
    pub async fn authenticate(&self) -> Result<(), LookupError> {
        self.get_token().await?;
        info!("Twitch API client authenticated.");
        Ok(())
    }

    pub async fn get_token(&self) -> Result<String, LookupError> {
        let mut token = self.token.lock().await;
        if let Some(cached) = token.as_ref().filter(|cached| cached.is_fresh()) {
            return Ok(cached.access_token.clone());
        }

        let fresh = self.request_token().await?;
        let access_token = fresh.access_token.clone();
        *token = Some(fresh);
        Ok(access_token)
    }

    pub async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn request_token(&self) -> Result<CachedToken, LookupError> {
        debug!("Requesting Twitch app access token...");
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Auth(format!("token request failed with {}: {}", status, body)));
        }

        let token: AppAccessToken = response.json().await?;
        debug!("Token expires in: {} seconds", token.expires_in);

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }

    /// Authenticated GET against a Helix endpoint, returning its `data` array.
    pub(crate) async fn helix_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, LookupError> {
        let token = self.get_token().await?;

        let response = self
            .client
            .get(format!("{}/{}", HELIX_BASE_URL, endpoint))
            .header("Client-ID", &self.client_id)
            .header("Authorization", format!("Bearer {}", token))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => {
                self.invalidate_token().await;
                let body = response.text().await.unwrap_or_default();
                warn!("Twitch rejected the access token; it will be renewed on the next request.");
                Err(LookupError::Auth(body))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let reset_at = response
                    .headers()
                    .get("Ratelimit-Reset")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<i64>().ok());
                Err(LookupError::RateLimited { reset_at })
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(LookupError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
            _ => {
                let body: HelixResponse<T> = response.json().await?;
                Ok(body.data)
            }
        }
    }

    pub async fn get_stream_info(&self, channel_name: &str) -> Result<Option<StreamInfo>, LookupError> {
        requests::get_stream_info(self, channel_name).await
    }

    pub async fn get_user_info(&self, login: &str) -> Result<Option<TwitchUser>, LookupError> {
        requests::get_user_info(self, login).await
    }
}

#[async_trait]
impl StreamStatusSource for TwitchAPIClient {
    async fn get_stream_info(&self, channel_name: &str) -> Result<Option<StreamInfo>, LookupError> {
        TwitchAPIClient::get_stream_info(self, channel_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_token_freshness_respects_margin() {
        let fresh = CachedToken {
            access_token: "a".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        let nearly_expired = CachedToken {
            access_token: "b".to_string(),
            expires_at: Instant::now() + Duration::from_secs(5),
        };

        assert!(fresh.is_fresh());
        assert!(!nearly_expired.is_fresh());
    }

    #[tokio::test]
    async fn invalidate_clears_cached_token() {
        let client = TwitchAPIClient::new("id", "secret", Duration::from_secs(5)).unwrap();
        *client.token.lock().await = Some(CachedToken {
            access_token: "cached".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        });

        assert_eq!(client.get_token().await.unwrap(), "cached");

        client.invalidate_token().await;
        assert!(client.token.lock().await.is_none());
    }
}
