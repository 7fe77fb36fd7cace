use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub user_id: i64,
    pub channel_name: String,
}

impl Subscription {
    pub fn new(user_id: i64, channel_name: impl Into<String>) -> Self {
        Self {
            user_id,
            channel_name: channel_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub display_name: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// A stream session that has already been announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifiedRecord {
    pub session_id: String,
    pub channel_name: String,
    pub notified_at: DateTime<Utc>,
}
