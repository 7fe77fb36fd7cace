use std::path::PathBuf;

use clap::Parser;
use log::info;
use stream_notifier::config::Config;
use stream_notifier::logging::{setup_logging, LogLevel};
use stream_notifier::{health, init, run};

#[derive(Parser, Debug)]
#[command(version, about = "Telegram bot that announces when followed Twitch channels go live")]
struct Cli {
    /// Path to a TOML config file (defaults to ./notifier.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured log level
    #[arg(long)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    setup_logging(config.log_level)?;
    info!("=== Starting Twitch Stream Notifier Bot ===");
    info!("Using config: {:?}", config);

    health::spawn_health_server(config.port)?;

    let ctx = init(config).await?;
    run(ctx).await
}
