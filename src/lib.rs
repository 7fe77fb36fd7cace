pub mod config;
pub mod health;
pub mod logging;
pub mod notifier;
pub mod storage;
pub mod telegram;
pub mod twitch;

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::notifier::{NotificationCycle, NotificationScheduler, NotificationSender, StreamStatusSource};
use crate::storage::StorageClient;
use crate::telegram::{run_update_loop, ChannelDirectory, CommandDispatcher, CommandRegistry, TelegramClient};
use crate::twitch::TwitchAPIClient;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Handles shared by the notification cycle and the command handlers.
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<StorageClient>,
    pub twitch: Arc<TwitchAPIClient>,
    pub telegram: Arc<TelegramClient>,
}

pub async fn init(config: Config) -> Result<AppContext, Box<dyn std::error::Error + Send + Sync>> {
    let store = StorageClient::new(&config.database_file)?;

    let twitch = TwitchAPIClient::new(
        &config.twitch_client_id,
        &config.twitch_client_secret,
        config.request_timeout(),
    )?;
    twitch.authenticate().await?;

    let telegram = TelegramClient::new(&config.telegram_token, config.request_timeout())?;

    Ok(AppContext {
        config: Arc::new(config),
        store: Arc::new(store),
        twitch: Arc::new(twitch),
        telegram: Arc::new(telegram),
    })
}

pub async fn run(ctx: AppContext) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let me = ctx.telegram.get_me().await?;
    info!("Logged in to Telegram as @{}", me.display_name());

    let shutdown = CancellationToken::new();

    let cycle = NotificationCycle::new(
        Arc::clone(&ctx.store),
        Arc::clone(&ctx.twitch) as Arc<dyn StreamStatusSource>,
        Arc::clone(&ctx.telegram) as Arc<dyn NotificationSender>,
        ctx.config.request_timeout(),
    );
    let scheduler = NotificationScheduler::new(
        cycle,
        Arc::clone(&ctx.store),
        ctx.config.first_check_delay(),
        ctx.config.check_interval(),
        ctx.config.notification_retention(),
    );

    let dispatcher = Arc::new(CommandDispatcher::new(
        CommandRegistry::new(),
        Arc::clone(&ctx.store),
        Arc::clone(&ctx.twitch) as Arc<dyn ChannelDirectory>,
        me.username.clone(),
    ));

    let handles = vec![
        tokio::spawn(scheduler.run(shutdown.clone())),
        tokio::spawn(run_update_loop(Arc::clone(&ctx.telegram), dispatcher, shutdown.clone())),
    ];

    info!("Bot is now running. Press Ctrl+C to exit.");

    let mut tasks = futures::future::select_all(handles);
    tokio::select! {
        (result, _, remaining) = &mut tasks => {
            if let Err(e) = result {
                error!("Background task crashed: {}", e);
            }
            shutdown.cancel();
            wait_for_tasks(remaining).await;
            return Err("a background task stopped unexpectedly".into());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down.");
        }
    }

    shutdown.cancel();
    wait_for_tasks(tasks.into_inner()).await;
    info!("Bot has shut down.");
    Ok(())
}

async fn wait_for_tasks(handles: Vec<tokio::task::JoinHandle<()>>) {
    if tokio::time::timeout(SHUTDOWN_GRACE, futures::future::join_all(handles)).await.is_err() {
        warn!("Timed out waiting for background tasks to stop");
    }
}
