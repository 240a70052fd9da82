use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "streak-bot", about = "Telegram bot tracking chat activity streaks")]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(
        short = 'c',
        long = "config",
        env = "STREAK_BOT_CONFIG",
        default_value = "config.yaml"
    )]
    pub config: PathBuf,
}
