use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::notifier::NotificationCycle;
use crate::storage::StorageClient;

/// Drives [`NotificationCycle`] on a fixed period.
///
/// Cycles run one after another on a single task. A cycle that overruns the
/// period delays the next one instead of overlapping it.
pub struct NotificationScheduler {
    cycle: NotificationCycle,
    store: Arc<StorageClient>,
    first_delay: Duration,
    period: Duration,
    retention: chrono::Duration,
}

impl NotificationScheduler {
    pub fn new(
        cycle: NotificationCycle,
        store: Arc<StorageClient>,
        first_delay: Duration,
        period: Duration,
        retention: chrono::Duration,
    ) -> Self {
        NotificationScheduler {
            cycle,
            store,
            first_delay,
            period,
            retention,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            "Stream checks start in {}s and repeat every {}s",
            self.first_delay.as_secs(),
            self.period.as_secs()
        );

        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = sleep(self.first_delay) => {}
        }

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.run_cycle().await;
        }

        info!("Stream check scheduler stopped.");
    }

    async fn run_cycle(&self) {
        match self.cycle.run_once().await {
            Ok(report) if report.is_empty() => {}
            Ok(report) => info!("Stream check finished: {}", report),
            Err(e) => error!("Stream check cycle failed: {}", e),
        }

        let cutoff = Utc::now() - self.retention;
        match self.store.prune_notifications(cutoff) {
            Ok(0) => {}
            Ok(removed) => debug!("Pruned {} old stream notifications", removed),
            Err(e) => warn!("Failed to prune old stream notifications: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::cycle::tests::{harness, live, FakeSource, Harness};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::notifier::{NotificationSender, StreamStatusSource};
    use crate::twitch::api::{LookupError, StreamInfo};

    fn scheduler(
        h: Harness,
        first_delay: u64,
        period: u64,
    ) -> (NotificationScheduler, Arc<FakeSource>) {
        let source = Arc::clone(&h.source);
        let scheduler = NotificationScheduler::new(
            h.cycle,
            Arc::clone(&h.store),
            Duration::from_secs(first_delay),
            Duration::from_secs(period),
            chrono::Duration::days(30),
        );
        (scheduler, source)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_after_initial_delay_then_every_period() {
        let h = harness();
        h.subscribe(1001, "foo");
        let (scheduler, source) = scheduler(h, 10, 60);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(shutdown.clone()));

        sleep(Duration::from_secs(5)).await;
        assert_eq!(source.lookup_count(), 0);

        // Cycles at t=10s and t=70s.
        sleep(Duration::from_secs(120)).await;
        assert_eq!(source.lookup_count(), 2);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_before_first_run_skips_all_cycles() {
        let h = harness();
        h.subscribe(1001, "foo");
        h.source.set("foo", live("s1"));
        let sender = Arc::clone(&h.sender);
        let (scheduler, source) = scheduler(h, 10, 60);

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        scheduler.run(shutdown).await;

        assert_eq!(source.lookup_count(), 0);
        assert!(sender.attempts().is_empty());
    }

    struct SlowSource {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        started: AtomicUsize,
    }

    #[async_trait]
    impl StreamStatusSource for SlowSource {
        async fn get_stream_info(&self, _channel_name: &str) -> Result<Option<StreamInfo>, LookupError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_secs(90)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overrunning_cycles_never_overlap() {
        let h = harness();
        h.subscribe(1001, "foo");

        let source = Arc::new(SlowSource {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            started: AtomicUsize::new(0),
        });
        let cycle = NotificationCycle::new(
            Arc::clone(&h.store),
            Arc::clone(&source) as Arc<dyn StreamStatusSource>,
            Arc::clone(&h.sender) as Arc<dyn NotificationSender>,
            Duration::from_secs(300),
        );
        let scheduler = NotificationScheduler::new(
            cycle,
            Arc::clone(&h.store),
            Duration::ZERO,
            Duration::from_secs(60),
            chrono::Duration::days(30),
        );

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(shutdown.clone()));

        sleep(Duration::from_secs(400)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(source.started.load(Ordering::SeqCst) >= 3);
    }
}
