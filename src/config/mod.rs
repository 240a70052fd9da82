pub use self::parser::{Config, DatabaseConfig, LoggingConfig, StreakConfig, TelegramConfig};
pub use self::validator::ConfigError;

mod parser;
mod validator;
