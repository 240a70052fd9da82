use chrono::{DateTime, Duration, Utc};

use crate::db::{ChatStreak, StreakHistoryEntry, UserActivity};

/// Streak counts that trigger a celebratory announcement.
pub const MILESTONES: [i64; 8] = [5, 10, 25, 50, 100, 200, 500, 1000];

pub const NO_ACTIVITY_TEXT: &str = "📊 No activity in this chat yet!";
pub const NO_STATS_TEXT: &str = "📊 No statistics for this chat yet!";
pub const NO_HISTORY_TEXT: &str = "📜 The streak history is still empty!";
pub const NO_TOP_TEXT: &str = "👥 No member statistics yet!";
pub const NOTHING_TO_RESET_TEXT: &str = "📊 Nothing to reset!";
pub const NOT_ADMIN_TEXT: &str = "❌ Only administrators can reset streaks!";

/// Tier emoji for a streak count, highest threshold first.
pub fn streak_emoji(count: i64) -> &'static str {
    if count >= 30 {
        "🔥💎"
    } else if count >= 20 {
        "🔥🏆"
    } else if count >= 10 {
        "🔥⭐"
    } else if count >= 5 {
        "🔥"
    } else {
        "✨"
    }
}

pub fn is_milestone(count: i64) -> bool {
    MILESTONES.contains(&count)
}

/// Hours left before the streak times out, clamped at zero.
pub fn hours_remaining(timeout: Duration, elapsed: Duration) -> f64 {
    let remaining = (timeout - elapsed).num_seconds().max(0);
    remaining as f64 / 3600.0
}

pub fn help_text(timeout_hours: u64) -> String {
    format!(
        "👋 Hi! I track activity streaks in this chat.\n\n\
         📊 Every message, photo, video and other content counts.\n\
         ⏰ The streak breaks after more than {timeout_hours} hours of silence.\n\n\
         Commands:\n\
         /streak - show the current streak\n\
         /stats - chat statistics\n\
         /history - past streaks\n\
         /top - most active members\n\
         /reset - reset the streak (admins only)"
    )
}

pub fn render_streak_status(
    streak: &ChatStreak,
    now: DateTime<Utc>,
    timeout: Duration,
) -> String {
    let elapsed = now - streak.last_activity;
    let minutes_ago = elapsed.num_minutes().max(0);
    let remaining = hours_remaining(timeout, elapsed);
    let emoji = streak_emoji(streak.streak_count);

    format!(
        "{emoji} <b>Current streak: {}</b>\n\
         👤 Last activity by: {}\n\
         🕐 {minutes_ago} minutes ago\n\
         ⏳ {remaining:.1} hours until reset",
        streak.streak_count, streak.last_username
    )
}

pub fn render_stats(current: i64, best: i64, total: i64) -> String {
    format!(
        "📊 <b>Chat statistics</b>\n\n\
         🔥 Current streak: {current}\n\
         🏆 Best streak: {best}\n\
         📈 Total activity: {total}"
    )
}

/// Numbered list of completed streaks, newest first, dates as day.month.year.
pub fn render_history(entries: &[StreakHistoryEntry]) -> String {
    let mut text = String::from("📜 <b>Streak history</b>\n\n");
    for (i, entry) in entries.iter().enumerate() {
        text.push_str(&format!(
            "{}. 🔥 <b>{}</b> ({})\n",
            i + 1,
            entry.streak_count,
            entry.end_date.format("%d.%m.%Y")
        ));
    }
    text
}

/// Medal glyphs for the first three ranks, plain ordinals after that.
pub fn render_leaderboard(users: &[UserActivity]) -> String {
    const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

    let mut text = String::from("👥 <b>Most active members</b>\n\n");
    for (i, user) in users.iter().enumerate() {
        let rank = MEDALS
            .get(i)
            .map(|m| (*m).to_string())
            .unwrap_or_else(|| format!("{}.", i + 1));
        text.push_str(&format!(
            "{rank} {}: <b>{}</b>\n",
            user.username, user.activity_count
        ));
    }
    text
}

pub fn render_break(old_streak: i64) -> String {
    format!(
        "💔 Streak broken! Previous streak: {old_streak}\n\
         🆕 Starting a new one!"
    )
}

pub fn render_milestone(count: i64) -> String {
    let emoji = streak_emoji(count);
    format!(
        "{emoji} <b>Wow! The streak reached {count}!</b>\n\
         Keep it up! 💪"
    )
}

pub fn render_reset_done(old_streak: i64) -> String {
    format!("🔄 Streak reset! Previous streak: {old_streak}")
}
