use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub streak: StreakConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_filename")]
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreakConfig {
    /// Hours of silence after which the current streak is considered broken.
    #[serde(default = "default_timeout_hours")]
    pub timeout_hours: u64,
    /// Broken streaks shorter than this are not announced to the chat.
    #[serde(default = "default_min_streak_to_announce")]
    pub min_streak_to_announce: i64,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            timeout_hours: default_timeout_hours(),
            min_streak_to_announce: default_min_streak_to_announce(),
        }
    }
}

impl StreakConfig {
    pub fn timeout(&self) -> chrono::Duration {
        chrono::Duration::hours(self.timeout_hours as i64)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.bot_token.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "telegram.bot_token cannot be empty".to_string(),
            ));
        }

        if self.telegram.api_base_url.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "telegram.api_base_url cannot be empty".to_string(),
            ));
        }

        if self.database.filename.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database.filename cannot be empty".to_string(),
            ));
        }

        if self.streak.timeout_hours == 0 {
            return Err(ConfigError::InvalidConfig(
                "streak.timeout_hours must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("STREAK_BOT_TOKEN") {
            self.telegram.bot_token = value;
        }
        if let Ok(value) = std::env::var("STREAK_BOT_DATABASE") {
            self.database.filename = value;
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_db_filename() -> String {
    "streaks.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_hours() -> u64 {
    24
}

fn default_min_streak_to_announce() -> i64 {
    3
}

#[cfg(test)]
mod tests {
    use super::Config;

    fn parse(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).expect("config should parse")
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse(
            r#"
telegram:
  bot_token: "123:abc"
database: {}
"#,
        );

        assert_eq!(config.telegram.api_base_url, "https://api.telegram.org");
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.database.filename, "streaks.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.streak.timeout_hours, 24);
        assert_eq!(config.streak.min_streak_to_announce, 3);
    }

    #[test]
    fn validate_rejects_empty_token() {
        let config = parse(
            r#"
telegram:
  bot_token: ""
database: {}
"#,
        );

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = parse(
            r#"
telegram:
  bot_token: "123:abc"
database: {}
streak:
  timeout_hours: 0
"#,
        );

        assert!(config.validate().is_err());
    }

    #[test]
    fn streak_timeout_converts_to_duration() {
        let config = parse(
            r#"
telegram:
  bot_token: "123:abc"
database: {}
streak:
  timeout_hours: 12
"#,
        );

        assert_eq!(config.streak.timeout(), chrono::Duration::hours(12));
    }
}
