use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::notifier::{DeliveryError, NotificationSender, StreamNotification};
use crate::telegram::models::{ApiResponse, GetUpdates, Message, SendMessage, SendPhoto, TelegramUser, Update};
use crate::telegram::TelegramError;

const API_BASE_URL: &str = "https://api.telegram.org";

// Long-poll window for getUpdates.
const POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal Telegram Bot API client over `reqwest`.
pub struct TelegramClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: &str, request_timeout: Duration) -> Result<Self, TelegramError> {
        Self::with_base_url(format!("{}/bot{}", API_BASE_URL, token), request_timeout)
    }

    fn with_base_url(base_url: String, request_timeout: Duration) -> Result<Self, TelegramError> {
        let client = Client::builder().build()?;
        Ok(TelegramClient {
            client,
            base_url,
            request_timeout,
        })
    }

    async fn call<P, R>(&self, method: &str, params: &P, timeout: Duration) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .timeout(timeout)
            .json(params)
            .send()
            .await?;

        let status = response.status();
        let body: ApiResponse<R> = response.json().await?;

        if !body.ok {
            return Err(TelegramError::Api {
                code: body.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: body.description.unwrap_or_default(),
            });
        }

        body.result
            .ok_or_else(|| TelegramError::Decode(format!("{} returned ok without a result", method)))
    }

    pub async fn get_me(&self) -> Result<TelegramUser, TelegramError> {
        self.call("getMe", &serde_json::json!({}), self.request_timeout).await
    }

    /// Long-polls for new updates starting at `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdates {
            offset,
            timeout: POLL_TIMEOUT.as_secs(),
            allowed_updates: vec!["message"],
        };
        self.call("getUpdates", &params, POLL_TIMEOUT + self.request_timeout).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        debug!("Sending message to chat {}", chat_id);
        let params = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        self.call("sendMessage", &params, self.request_timeout).await
    }

    pub async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str) -> Result<Message, TelegramError> {
        debug!("Sending photo to chat {}", chat_id);
        let params = SendPhoto {
            chat_id,
            photo: photo_url,
            caption,
            parse_mode: "HTML",
        };
        self.call("sendPhoto", &params, self.request_timeout).await
    }
}

#[async_trait]
impl NotificationSender for TelegramClient {
    async fn send_notification(
        &self,
        user_id: i64,
        notification: &StreamNotification,
    ) -> Result<(), DeliveryError> {
        match notification.preview_url.as_deref() {
            Some(preview_url) => self.send_photo(user_id, preview_url, &notification.caption).await?,
            None => self.send_message(user_id, &notification.caption).await?,
        };
        Ok(())
    }
}
