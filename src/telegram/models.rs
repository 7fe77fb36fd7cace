use serde::{Deserialize, Serialize};

/// Envelope returned by every Bot API method.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

impl TelegramUser {
    pub fn display_name(&self) -> &str {
        match self.username.as_deref() {
            Some(username) if !username.is_empty() => username,
            _ if !self.first_name.is_empty() => self.first_name.as_str(),
            _ => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    pub disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendPhoto<'a> {
    pub chat_id: i64,
    pub photo: &'a str,
    pub caption: &'a str,
    pub parse_mode: &'static str,
}
