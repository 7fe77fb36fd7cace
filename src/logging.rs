use std::fmt;
use std::str::FromStr;

use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    ERROR,
    WARN,
    #[default]
    INFO,
    DEBUG,
    TRACE,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::ERROR => LevelFilter::Error,
            LogLevel::WARN => LevelFilter::Warn,
            LogLevel::INFO => LevelFilter::Info,
            LogLevel::DEBUG => LevelFilter::Debug,
            LogLevel::TRACE => LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::ERROR),
            "warn" | "warning" => Ok(LogLevel::WARN),
            "info" => Ok(LogLevel::INFO),
            "debug" => Ok(LogLevel::DEBUG),
            "trace" => Ok(LogLevel::TRACE),
            other => Err(format!("Unknown log level: {}", other)),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::ERROR => "error",
            LogLevel::WARN => "warn",
            LogLevel::INFO => "info",
            LogLevel::DEBUG => "debug",
            LogLevel::TRACE => "trace",
        };
        f.write_str(name)
    }
}

/// Installs the global logger. Dependency chatter from the HTTP stack is
/// capped at `warn` regardless of the requested level.
pub fn setup_logging(level: LogLevel) -> Result<(), fern::InitError> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} - {} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .level(level.to_level_filter())
        .level_for("hyper", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("warp", LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()?;

    Ok(())
}
