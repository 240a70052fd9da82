use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current streak state for one chat. At most one row per chat exists;
/// the row is deleted outright on manual reset, never zeroed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreak {
    pub chat_id: i64,
    pub streak_count: i64,
    pub last_activity: DateTime<Utc>,
    pub last_user_id: i64,
    pub last_username: String,
}

/// Replacement values for a streak row, written with a compare-and-swap
/// guard on the previously observed `last_activity`.
#[derive(Debug, Clone)]
pub struct StreakReplacement {
    pub streak_count: i64,
    pub last_activity: DateTime<Utc>,
    pub last_user_id: i64,
    pub last_username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreakEndReason {
    Timeout,
    ManualReset,
}

impl StreakEndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreakEndReason::Timeout => "timeout",
            StreakEndReason::ManualReset => "manual_reset",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "timeout" => Some(StreakEndReason::Timeout),
            "manual_reset" => Some(StreakEndReason::ManualReset),
            _ => None,
        }
    }
}

/// Immutable record of a completed streak, written exactly once when a
/// streak times out or is manually reset.
///
/// `start_date` carries the ended streak's final `last_activity`, not its
/// true first event. The reference implementation records it this way and
/// downstream consumers rely on it, so the derivation is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakHistoryEntry {
    pub id: i64,
    pub chat_id: i64,
    pub chat_title: String,
    pub streak_count: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: StreakEndReason,
}

#[derive(Debug, Clone)]
pub struct NewStreakHistoryEntry {
    pub chat_id: i64,
    pub chat_title: String,
    pub streak_count: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: StreakEndReason,
}

/// Per-user activity tally within one chat. `username` always holds the
/// most recently seen value for that user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActivity {
    pub id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    pub username: String,
    pub activity_count: i64,
    pub last_activity: DateTime<Utc>,
}
