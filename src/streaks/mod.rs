use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::StreakConfig;
use crate::db::{ChatStreak, DatabaseManager, NewStreakHistoryEntry, StreakEndReason, StreakReplacement};

pub mod commands;
pub mod engine;
pub mod presentation;

pub use self::commands::Command;
pub use self::engine::{StreakDecision, StreakOutcome};

const HISTORY_LIMIT: i64 = 10;
const LEADERBOARD_LIMIT: i64 = 10;
const PRIVATE_CHAT_TITLE: &str = "Private chat";

// Compare-and-swap retries before giving up on one event
const MAX_APPLY_ATTEMPTS: usize = 5;

/// The slice of the messaging platform the tracker needs: replies into a
/// chat and the admin lookup guarding `/reset`.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;
    async fn send_html(&self, chat_id: i64, text: &str) -> Result<()>;
    async fn is_admin(&self, chat_id: i64, user_id: i64) -> Result<bool>;
}

/// Message content kinds the tracker can see. Everything that is not in
/// this list arrives as `Other` and never counts as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Photo,
    Video,
    Document,
    Audio,
    Voice,
    VideoNote,
    Sticker,
    Animation,
    Other,
}

/// One inbound chat event, already detached from the transport types.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub chat_id: i64,
    pub chat_title: Option<String>,
    pub content_type: ContentType,
    pub text: Option<String>,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl InboundEvent {
    pub fn command(&self) -> Option<Command> {
        if self.content_type != ContentType::Text {
            return None;
        }
        self.text.as_deref().and_then(commands::parse)
    }

    /// An event counts towards the streak iff its content kind is
    /// trackable and, for text, it is not a command.
    pub fn is_qualifying(&self) -> bool {
        match self.content_type {
            ContentType::Other => false,
            ContentType::Text => !self
                .text
                .as_deref()
                .map(|t| t.starts_with('/'))
                .unwrap_or(false),
            _ => true,
        }
    }

    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.first_name.clone())
            .unwrap_or_else(|| self.user_id.to_string())
    }

    pub fn chat_title_or_default(&self) -> String {
        self.chat_title
            .clone()
            .unwrap_or_else(|| PRIVATE_CHAT_TITLE.to_string())
    }
}

/// Event-handling core: owns the streak bookkeeping and renders replies.
/// Constructed once at startup with its collaborators passed in.
pub struct StreakTracker {
    gateway: Arc<dyn MessagingGateway>,
    db: DatabaseManager,
    settings: StreakConfig,
}

impl StreakTracker {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        db: DatabaseManager,
        settings: StreakConfig,
    ) -> Self {
        Self {
            gateway,
            db,
            settings,
        }
    }

    pub async fn handle_event(&self, event: InboundEvent) -> Result<()> {
        if let Some(command) = event.command() {
            debug!(chat_id = event.chat_id, ?command, "handling command");
            return self.handle_command(command, &event).await;
        }

        if event.is_qualifying() {
            self.track_activity(&event, Utc::now()).await?;
        }
        Ok(())
    }

    async fn handle_command(&self, command: Command, event: &InboundEvent) -> Result<()> {
        match command {
            Command::Start => self.cmd_start(event).await,
            Command::Streak => self.cmd_streak(event).await,
            Command::Stats => self.cmd_stats(event).await,
            Command::History => self.cmd_history(event).await,
            Command::Top => self.cmd_top(event).await,
            Command::Reset => self.cmd_reset(event).await,
        }
    }

    async fn track_activity(&self, event: &InboundEvent, now: DateTime<Utc>) -> Result<()> {
        let outcome = self.apply_streak_event(event, now).await?;

        self.db
            .activity_store()
            .record_activity(event.chat_id, event.user_id, &event.display_name(), now)
            .await?;

        if let Some(old_streak) = outcome.broken_streak {
            if old_streak >= self.settings.min_streak_to_announce {
                self.gateway
                    .send_text(event.chat_id, &presentation::render_break(old_streak))
                    .await?;
            }
        }

        if presentation::is_milestone(outcome.count) {
            self.gateway
                .send_html(event.chat_id, &presentation::render_milestone(outcome.count))
                .await?;
        }

        Ok(())
    }

    /// Advances the chat's streak for one qualifying event. The write is
    /// guarded on the previously read `last_activity`, so two events
    /// racing on the same chat advance the streak exactly once each.
    async fn apply_streak_event(
        &self,
        event: &InboundEvent,
        event_time: DateTime<Utc>,
    ) -> Result<StreakOutcome> {
        let store = self.db.streak_store();
        let timeout = self.settings.timeout();
        let name = event.display_name();

        for _ in 0..MAX_APPLY_ATTEMPTS {
            let existing = store.get_streak(event.chat_id).await?;
            let decision = engine::decide(existing.as_ref(), event_time, timeout);

            match (decision, existing) {
                (StreakDecision::Start, _) => {
                    let fresh = ChatStreak {
                        chat_id: event.chat_id,
                        streak_count: 1,
                        last_activity: event_time,
                        last_user_id: event.user_id,
                        last_username: name.clone(),
                    };
                    if store.insert_streak(&fresh).await? {
                        return Ok(StreakOutcome {
                            is_new_streak: true,
                            count: 1,
                            broken_streak: None,
                        });
                    }
                }
                (StreakDecision::Continue { new_count }, Some(prior)) => {
                    let replacement = StreakReplacement {
                        streak_count: new_count,
                        last_activity: event_time,
                        last_user_id: event.user_id,
                        last_username: name.clone(),
                    };
                    if store
                        .compare_and_swap_streak(event.chat_id, prior.last_activity, &replacement)
                        .await?
                    {
                        return Ok(StreakOutcome {
                            is_new_streak: false,
                            count: new_count,
                            broken_streak: None,
                        });
                    }
                }
                (StreakDecision::Break { old_count }, Some(prior)) => {
                    let replacement = StreakReplacement {
                        streak_count: 1,
                        last_activity: event_time,
                        last_user_id: event.user_id,
                        last_username: name.clone(),
                    };
                    if store
                        .compare_and_swap_streak(event.chat_id, prior.last_activity, &replacement)
                        .await?
                    {
                        // The archived start date carries the ended streak's
                        // last activity, matching what downstream consumers
                        // of the history already expect.
                        self.db
                            .history_store()
                            .append_entry(&NewStreakHistoryEntry {
                                chat_id: event.chat_id,
                                chat_title: event.chat_title_or_default(),
                                streak_count: old_count,
                                start_date: prior.last_activity,
                                end_date: event_time,
                                reason: StreakEndReason::Timeout,
                            })
                            .await?;
                        return Ok(StreakOutcome {
                            is_new_streak: true,
                            count: 1,
                            broken_streak: Some(old_count),
                        });
                    }
                }
                // decide() only continues or breaks when a row exists
                (_, None) => {}
            }

            debug!(chat_id = event.chat_id, "streak write lost a race, retrying");
        }

        anyhow::bail!(
            "could not advance streak for chat {} after {} attempts",
            event.chat_id,
            MAX_APPLY_ATTEMPTS
        )
    }

    async fn cmd_start(&self, event: &InboundEvent) -> Result<()> {
        self.gateway
            .send_text(
                event.chat_id,
                &presentation::help_text(self.settings.timeout_hours),
            )
            .await
    }

    async fn cmd_streak(&self, event: &InboundEvent) -> Result<()> {
        let Some(streak) = self.db.streak_store().get_streak(event.chat_id).await? else {
            return self
                .gateway
                .send_text(event.chat_id, presentation::NO_ACTIVITY_TEXT)
                .await;
        };

        let text =
            presentation::render_streak_status(&streak, Utc::now(), self.settings.timeout());
        self.gateway.send_html(event.chat_id, &text).await
    }

    async fn cmd_stats(&self, event: &InboundEvent) -> Result<()> {
        let streak = self.db.streak_store().get_streak(event.chat_id).await?;
        let best = self
            .db
            .history_store()
            .best_streak(event.chat_id)
            .await?
            .unwrap_or(0);
        let total = self.db.activity_store().total_activity(event.chat_id).await?;

        if streak.is_none() && best == 0 {
            return self
                .gateway
                .send_text(event.chat_id, presentation::NO_STATS_TEXT)
                .await;
        }

        let current = streak.map(|s| s.streak_count).unwrap_or(0);
        let text = presentation::render_stats(current, best.max(current), total);
        self.gateway.send_html(event.chat_id, &text).await
    }

    async fn cmd_history(&self, event: &InboundEvent) -> Result<()> {
        let entries = self
            .db
            .history_store()
            .recent_entries(event.chat_id, HISTORY_LIMIT)
            .await?;

        if entries.is_empty() {
            return self
                .gateway
                .send_text(event.chat_id, presentation::NO_HISTORY_TEXT)
                .await;
        }

        self.gateway
            .send_html(event.chat_id, &presentation::render_history(&entries))
            .await
    }

    async fn cmd_top(&self, event: &InboundEvent) -> Result<()> {
        let users = self
            .db
            .activity_store()
            .top_users(event.chat_id, LEADERBOARD_LIMIT)
            .await?;

        if users.is_empty() {
            return self
                .gateway
                .send_text(event.chat_id, presentation::NO_TOP_TEXT)
                .await;
        }

        self.gateway
            .send_html(event.chat_id, &presentation::render_leaderboard(&users))
            .await
    }

    async fn cmd_reset(&self, event: &InboundEvent) -> Result<()> {
        match self.gateway.is_admin(event.chat_id, event.user_id).await {
            Ok(true) => {}
            Ok(false) => {
                return self
                    .gateway
                    .send_text(event.chat_id, presentation::NOT_ADMIN_TEXT)
                    .await;
            }
            // Fail-open: the reference bot skips the admin check when the
            // lookup errors, and that behavior is kept on purpose.
            Err(e) => {
                warn!(
                    chat_id = event.chat_id,
                    user_id = event.user_id,
                    error = %e,
                    "admin lookup failed, allowing reset"
                );
            }
        }

        let Some(streak) = self.db.streak_store().get_streak(event.chat_id).await? else {
            return self
                .gateway
                .send_text(event.chat_id, presentation::NOTHING_TO_RESET_TEXT)
                .await;
        };

        self.db
            .history_store()
            .append_entry(&NewStreakHistoryEntry {
                chat_id: event.chat_id,
                chat_title: event.chat_title_or_default(),
                streak_count: streak.streak_count,
                start_date: streak.last_activity,
                end_date: Utc::now(),
                reason: StreakEndReason::ManualReset,
            })
            .await?;
        self.db.streak_store().delete_streak(event.chat_id).await?;

        self.gateway
            .send_text(
                event.chat_id,
                &presentation::render_reset_done(streak.streak_count),
            )
            .await
    }
}
