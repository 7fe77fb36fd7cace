mod cycle;
mod errors;
mod format;
mod scheduler;

pub use cycle::{ChannelOutcome, CycleReport, NotificationCycle};
pub use errors::DeliveryError;
pub use format::{format_notification, StreamNotification};
pub use scheduler::NotificationScheduler;

use async_trait::async_trait;

use crate::twitch::api::{LookupError, StreamInfo};

/// Reports whether a channel is live right now.
#[async_trait]
pub trait StreamStatusSource: Send + Sync {
    /// `Ok(None)` means the channel is offline.
    async fn get_stream_info(&self, channel_name: &str) -> Result<Option<StreamInfo>, LookupError>;
}

/// Delivers a stream notification to one user.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_notification(
        &self,
        user_id: i64,
        notification: &StreamNotification,
    ) -> Result<(), DeliveryError>;
}
