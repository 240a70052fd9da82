#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod cli;
mod config;
mod db;
mod streaks;
mod telegram;
mod utils;

use config::Config;
use streaks::StreakTracker;
use telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = Config::load_from_file(&cli.config)?;
    utils::logging::init_tracing(&config.logging.level);

    info!("streak bot starting up");

    let db_manager = db::DatabaseManager::new(&config.database)?;
    db_manager.migrate().await?;
    info!(database = %config.database.filename, "database initialized");

    let telegram_client = Arc::new(TelegramClient::new(&config.telegram)?);
    let tracker = Arc::new(StreakTracker::new(
        telegram_client.clone(),
        db_manager,
        config.streak.clone(),
    ));

    telegram::poller::run(telegram_client, tracker, config.telegram.poll_timeout_secs).await
}
