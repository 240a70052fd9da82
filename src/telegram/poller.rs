use std::sync::Arc;

use anyhow::Result;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

use super::TelegramClient;
use crate::streaks::StreakTracker;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polling loop. Updates are handled one at a time, so streak
/// writes for a chat are naturally serialized within one process.
pub async fn run(
    client: Arc<TelegramClient>,
    tracker: Arc<StreakTracker>,
    poll_timeout_secs: u64,
) -> Result<()> {
    info!("long polling started");
    let mut offset = 0i64;

    loop {
        let updates = match client.get_updates(offset, poll_timeout_secs).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "getUpdates failed, retrying");
                sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(event) = message.to_inbound_event() else {
                continue;
            };

            // one failing update is dropped, the loop keeps going
            if let Err(e) = tracker.handle_event(event).await {
                error!(update_id = update.update_id, "failed to handle update: {e:#}");
            }
        }
    }
}
