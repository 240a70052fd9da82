use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::DatabaseError;
use super::models::{
    ChatStreak, NewStreakHistoryEntry, StreakHistoryEntry, StreakReplacement, UserActivity,
};

#[async_trait]
pub trait StreakStore: Send + Sync {
    async fn get_streak(&self, chat_id: i64) -> Result<Option<ChatStreak>, DatabaseError>;

    /// Inserts a fresh streak row. Returns false when a row for the chat
    /// already exists, which means a concurrent event won the insert.
    async fn insert_streak(&self, streak: &ChatStreak) -> Result<bool, DatabaseError>;

    /// Replaces the streak row only if `last_activity` still matches the
    /// previously observed value. Returns false when the guard failed,
    /// which means a concurrent event advanced the streak first.
    async fn compare_and_swap_streak(
        &self,
        chat_id: i64,
        expected_last_activity: DateTime<Utc>,
        replacement: &StreakReplacement,
    ) -> Result<bool, DatabaseError>;

    /// Deletes the streak row. Returns false when no row existed.
    async fn delete_streak(&self, chat_id: i64) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append_entry(&self, entry: &NewStreakHistoryEntry) -> Result<(), DatabaseError>;

    /// Most recent completed streaks for a chat, ordered by end date
    /// descending.
    async fn recent_entries(
        &self,
        chat_id: i64,
        limit: i64,
    ) -> Result<Vec<StreakHistoryEntry>, DatabaseError>;

    /// Highest streak count ever recorded in the history for a chat.
    async fn best_streak(&self, chat_id: i64) -> Result<Option<i64>, DatabaseError>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Creates the (chat, user) tally at 1 or increments it by 1, always
    /// overwriting username and last_activity with the latest values.
    async fn record_activity(
        &self,
        chat_id: i64,
        user_id: i64,
        username: &str,
        event_time: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;

    /// Most active users in a chat, ordered by activity count descending.
    async fn top_users(&self, chat_id: i64, limit: i64)
    -> Result<Vec<UserActivity>, DatabaseError>;

    /// Sum of all activity counts in a chat.
    async fn total_activity(&self, chat_id: i64) -> Result<i64, DatabaseError>;
}
