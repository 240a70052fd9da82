use chrono::{DateTime, Duration, Utc};

use crate::db::ChatStreak;

/// What a qualifying event does to the chat's streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakDecision {
    /// No streak row exists yet, start one at 1.
    Start,
    /// The gap stayed within the timeout, advance the count.
    Continue { new_count: i64 },
    /// The gap exceeded the timeout, archive the old count and restart at 1.
    Break { old_count: i64 },
}

/// Result of applying a qualifying event, as reported to announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakOutcome {
    pub is_new_streak: bool,
    pub count: i64,
    /// Final count of the streak that just broke, if one did.
    pub broken_streak: Option<i64>,
}

/// Decides how a qualifying event at `event_time` affects the current
/// streak. A gap of exactly `timeout` still continues the streak; only a
/// strictly larger gap breaks it.
pub fn decide(
    existing: Option<&ChatStreak>,
    event_time: DateTime<Utc>,
    timeout: Duration,
) -> StreakDecision {
    let Some(streak) = existing else {
        return StreakDecision::Start;
    };

    let elapsed = event_time - streak.last_activity;
    if elapsed > timeout {
        StreakDecision::Break {
            old_count: streak.streak_count,
        }
    } else {
        StreakDecision::Continue {
            new_count: streak.streak_count + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{StreakDecision, decide};
    use crate::db::ChatStreak;

    fn timeout() -> Duration {
        Duration::hours(24)
    }

    fn streak(count: i64, last_activity: chrono::DateTime<Utc>) -> ChatStreak {
        ChatStreak {
            chat_id: 100,
            streak_count: count,
            last_activity,
            last_user_id: 7,
            last_username: "alice".to_string(),
        }
    }

    #[test]
    fn first_event_starts_a_streak() {
        let decision = decide(None, Utc::now(), timeout());
        assert_eq!(decision, StreakDecision::Start);
    }

    #[test]
    fn event_within_timeout_continues() {
        let t0 = Utc::now();
        let decision = decide(Some(&streak(4, t0)), t0 + Duration::hours(1), timeout());
        assert_eq!(decision, StreakDecision::Continue { new_count: 5 });
    }

    #[test]
    fn gap_of_exactly_the_timeout_still_continues() {
        let t0 = Utc::now();
        let decision = decide(Some(&streak(4, t0)), t0 + timeout(), timeout());
        assert_eq!(decision, StreakDecision::Continue { new_count: 5 });
    }

    #[test]
    fn gap_beyond_timeout_breaks() {
        let t0 = Utc::now();
        let decision = decide(
            Some(&streak(17, t0)),
            t0 + timeout() + Duration::seconds(1),
            timeout(),
        );
        assert_eq!(decision, StreakDecision::Break { old_count: 17 });
    }

    #[test]
    fn event_older_than_last_activity_continues() {
        // Clock skew between events must not break a streak.
        let t0 = Utc::now();
        let decision = decide(Some(&streak(4, t0)), t0 - Duration::minutes(5), timeout());
        assert_eq!(decision, StreakDecision::Continue { new_count: 5 });
    }
}
