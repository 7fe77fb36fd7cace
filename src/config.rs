use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogLevel;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub telegram_token: String,
    #[serde(default)]
    pub twitch_client_id: String,
    #[serde(default)]
    pub twitch_client_secret: String,
    pub database_file: String,
    pub port: u16,
    pub check_interval_secs: u64,
    pub first_check_delay_secs: u64,
    pub request_timeout_secs: u64,
    pub notification_retention_days: u32,
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Config {
    pub const DEFAULT_CONFIG_PATH: &'static str = "notifier.toml";

    /// Loads defaults, then the TOML file (optional unless `path` is given),
    /// then environment variables such as `TELEGRAM_TOKEN` and `PORT`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(path, config::Environment::default())
    }

    fn from_sources(path: Option<&Path>, env: config::Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(Self::DEFAULT_CONFIG_PATH).required(false),
        };

        let settings = config::Config::builder()
            .set_default("database_file", "bot_database.db")?
            .set_default("port", 10000_i64)?
            .set_default("check_interval_secs", 60_i64)?
            .set_default("first_check_delay_secs", 10_i64)?
            .set_default("request_timeout_secs", 10_i64)?
            .set_default("notification_retention_days", 30_i64)?
            .add_source(file)
            .add_source(env)
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_token.trim().is_empty() {
            return Err(ConfigError::Missing("telegram_token"));
        }
        if self.twitch_client_id.trim().is_empty() {
            return Err(ConfigError::Missing("twitch_client_id"));
        }
        if self.twitch_client_secret.trim().is_empty() {
            return Err(ConfigError::Missing("twitch_client_secret"));
        }
        if self.database_file.trim().is_empty() {
            return Err(ConfigError::Missing("database_file"));
        }
        if self.check_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "check_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "request_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn first_check_delay(&self) -> Duration {
        Duration::from_secs(self.first_check_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notification_retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.notification_retention_days))
    }
}

// Credentials stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_token", &"<redacted>")
            .field("twitch_client_id", &self.twitch_client_id)
            .field("twitch_client_secret", &"<redacted>")
            .field("database_file", &self.database_file)
            .field("port", &self.port)
            .field("check_interval_secs", &self.check_interval_secs)
            .field("first_check_delay_secs", &self.first_check_delay_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("notification_retention_days", &self.notification_retention_days)
            .field("log_level", &self.log_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::default().source(Some(map))
    }

    fn credentials() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TELEGRAM_TOKEN", "123:abc"),
            ("TWITCH_CLIENT_ID", "client"),
            ("TWITCH_CLIENT_SECRET", "s3cr3t-value"),
        ]
    }

    #[test]
    fn applies_defaults_when_only_credentials_are_set() {
        let config = Config::from_sources(None, env(&credentials())).unwrap();

        assert_eq!(config.port, 10000);
        assert_eq!(config.database_file, "bot_database.db");
        assert_eq!(config.check_interval(), Duration::from_secs(60));
        assert_eq!(config.first_check_delay(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.notification_retention(), chrono::Duration::days(30));
        assert_eq!(config.log_level, LogLevel::INFO);
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "telegram_token = \"from-file\"\ntwitch_client_id = \"client\"\ntwitch_client_secret = \"secret\"\nport = 8080\ncheck_interval_secs = 30\nlog_level = \"debug\""
        )
        .unwrap();

        let config = Config::from_sources(
            Some(file.path()),
            env(&[("PORT", "9090"), ("DATABASE_FILE", "/data/bot.db")]),
        )
        .unwrap();

        assert_eq!(config.telegram_token, "from-file");
        assert_eq!(config.port, 9090);
        assert_eq!(config.database_file, "/data/bot.db");
        assert_eq!(config.check_interval_secs, 30);
        assert_eq!(config.log_level, LogLevel::DEBUG);
    }

    #[test]
    fn rejects_missing_token() {
        let err = Config::from_sources(
            None,
            env(&[("TWITCH_CLIENT_ID", "client"), ("TWITCH_CLIENT_SECRET", "secret")]),
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Missing("telegram_token")));
    }

    #[test]
    fn rejects_zero_interval() {
        let mut vars = credentials();
        vars.push(("CHECK_INTERVAL_SECS", "0"));

        let err = Config::from_sources(None, env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "check_interval_secs", .. }));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = Config::from_sources(None, env(&credentials())).unwrap();
        let printed = format!("{:?}", config);

        assert!(!printed.contains("123:abc"));
        assert!(!printed.contains("s3cr3t-value"));
    }
}
