use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::time::timeout;

use crate::notifier::format::{format_notification, StreamNotification};
use crate::notifier::{DeliveryError, NotificationSender, StreamStatusSource};
use crate::storage::{StorageClient, StoreError, Subscription};
use crate::twitch::api::{LookupError, StreamInfo};

/// What happened to one channel during a cycle.
#[derive(Debug)]
pub enum ChannelOutcome {
    Offline,
    AlreadyNotified { session_id: String },
    Notified { session_id: String, delivered: usize, failed: usize },
    LookupFailed(LookupError),
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub channels: Vec<(String, ChannelOutcome)>,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn outcome(&self, channel: &str) -> Option<&ChannelOutcome> {
        self.channels
            .iter()
            .find(|(name, _)| name == channel)
            .map(|(_, outcome)| outcome)
    }

    pub fn notified(&self) -> usize {
        self.channels
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ChannelOutcome::Notified { .. }))
            .count()
    }

    pub fn lookup_failures(&self) -> usize {
        self.channels
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ChannelOutcome::LookupFailed(_)))
            .count()
    }

    pub fn deliveries(&self) -> (usize, usize) {
        self.channels
            .iter()
            .fold((0, 0), |(ok, failed), (_, outcome)| match outcome {
                ChannelOutcome::Notified { delivered, failed: f, .. } => (ok + delivered, failed + f),
                _ => (ok, failed),
            })
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (delivered, failed) = self.deliveries();
        write!(
            f,
            "{} channels checked, {} newly live, {} lookup failures, {} messages delivered, {} failed",
            self.channels.len(),
            self.notified(),
            self.lookup_failures(),
            delivered,
            failed
        )
    }
}

/// One pass over all subscriptions: look up each unique channel once and
/// announce sessions that have not been announced before.
pub struct NotificationCycle {
    store: Arc<StorageClient>,
    source: Arc<dyn StreamStatusSource>,
    sender: Arc<dyn NotificationSender>,
    request_timeout: Duration,
}

impl NotificationCycle {
    pub fn new(
        store: Arc<StorageClient>,
        source: Arc<dyn StreamStatusSource>,
        sender: Arc<dyn NotificationSender>,
        request_timeout: Duration,
    ) -> Self {
        NotificationCycle {
            store,
            source,
            sender,
            request_timeout,
        }
    }

    /// Runs one cycle. Lookup and delivery failures are contained per channel
    /// and per user; only store failures abort the cycle.
    pub async fn run_once(&self) -> Result<CycleReport, StoreError> {
        let subscriptions = self.store.get_all_subscriptions()?;
        if subscriptions.is_empty() {
            debug!("No subscriptions, skipping stream check.");
            return Ok(CycleReport::default());
        }

        let channels = group_by_channel(&subscriptions);
        info!("Checking {} unique channels...", channels.len());

        let mut report = CycleReport::default();
        for (channel, subscribers) in channels {
            let outcome = self.check_channel(&channel, &subscribers).await?;
            report.channels.push((channel, outcome));
        }
        Ok(report)
    }

    async fn check_channel(
        &self,
        channel: &str,
        subscribers: &BTreeSet<i64>,
    ) -> Result<ChannelOutcome, StoreError> {
        let stream = match self.lookup(channel).await {
            Ok(Some(stream)) => stream,
            Ok(None) => return Ok(ChannelOutcome::Offline),
            Err(e) => {
                error!("Error while checking channel {}: {}", channel, e);
                return Ok(ChannelOutcome::LookupFailed(e));
            }
        };

        if self.store.is_stream_notified(&stream.id)? {
            debug!("Stream {} of {} already announced", stream.id, channel);
            return Ok(ChannelOutcome::AlreadyNotified { session_id: stream.id });
        }

        info!(
            "{} went live (session {}), notifying {} subscribers",
            channel,
            stream.id,
            subscribers.len()
        );
        let notification = format_notification(&stream);

        let mut delivered = 0;
        let mut failed = 0;
        for &user_id in subscribers {
            match self.deliver(user_id, &notification).await {
                Ok(()) => {
                    info!("Notification about {} sent to user {}", channel, user_id);
                    delivered += 1;
                }
                Err(DeliveryError::Telegram(e)) if e.is_forbidden() => {
                    info!("User {} has blocked the bot, skipped {}", user_id, channel);
                    failed += 1;
                }
                Err(e) => {
                    error!("Failed to notify user {} about {}: {}", user_id, channel, e);
                    failed += 1;
                }
            }
        }

        // Recorded whatever the deliveries did: each session is announced once.
        self.store.add_stream_notification(&stream.id, channel)?;

        Ok(ChannelOutcome::Notified {
            session_id: stream.id,
            delivered,
            failed,
        })
    }

    async fn lookup(&self, channel: &str) -> Result<Option<StreamInfo>, LookupError> {
        match timeout(self.request_timeout, self.source.get_stream_info(channel)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout),
        }
    }

    async fn deliver(&self, user_id: i64, notification: &StreamNotification) -> Result<(), DeliveryError> {
        match timeout(self.request_timeout, self.sender.send_notification(user_id, notification)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout),
        }
    }
}

/// Merges subscriptions into `channel -> subscribers`, keyed case-insensitively.
pub(crate) fn group_by_channel(subscriptions: &[Subscription]) -> BTreeMap<String, BTreeSet<i64>> {
    let mut channels: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
    for subscription in subscriptions {
        channels
            .entry(subscription.channel_name.trim().to_lowercase())
            .or_default()
            .insert(subscription.user_id);
    }
    channels
}
