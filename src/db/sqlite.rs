use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel::upsert::excluded;
use std::sync::Arc;

use crate::db::schema_sqlite::{streak_history, streaks, user_activity};

use super::{
    DatabaseError,
    models::{
        ChatStreak, NewStreakHistoryEntry, StreakEndReason, StreakHistoryEntry, StreakReplacement,
        UserActivity,
    },
};

// Timestamps are stored as RFC3339 text, SQLite has no native datetime type
fn datetime_to_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Query(format!("invalid datetime format: {}", e)))
}

fn establish_connection(path: &str) -> Result<SqliteConnection, DatabaseError> {
    SqliteConnection::establish(path).map_err(|e| DatabaseError::Connection(e.to_string()))
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = streaks)]
struct DbChatStreak {
    chat_id: i64,
    streak_count: i64,
    last_activity: String,
    last_user_id: i64,
    last_username: String,
}

impl DbChatStreak {
    fn to_chat_streak(&self) -> Result<ChatStreak, DatabaseError> {
        Ok(ChatStreak {
            chat_id: self.chat_id,
            streak_count: self.streak_count,
            last_activity: string_to_datetime(&self.last_activity)?,
            last_user_id: self.last_user_id,
            last_username: self.last_username.clone(),
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = streaks)]
struct NewChatStreak<'a> {
    chat_id: i64,
    streak_count: i64,
    last_activity: String,
    last_user_id: i64,
    last_username: &'a str,
}

#[derive(AsChangeset)]
#[diesel(table_name = streaks)]
struct StreakChangeset<'a> {
    streak_count: i64,
    last_activity: String,
    last_user_id: i64,
    last_username: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = streak_history)]
struct DbHistoryEntry {
    id: i64,
    chat_id: i64,
    chat_title: String,
    streak_count: i64,
    start_date: String,
    end_date: String,
    reason: String,
}

impl DbHistoryEntry {
    fn to_history_entry(&self) -> Result<StreakHistoryEntry, DatabaseError> {
        let reason = StreakEndReason::parse(&self.reason).ok_or_else(|| {
            DatabaseError::Query(format!("unknown streak end reason: {}", self.reason))
        })?;
        Ok(StreakHistoryEntry {
            id: self.id,
            chat_id: self.chat_id,
            chat_title: self.chat_title.clone(),
            streak_count: self.streak_count,
            start_date: string_to_datetime(&self.start_date)?,
            end_date: string_to_datetime(&self.end_date)?,
            reason,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = streak_history)]
struct NewHistoryRow<'a> {
    chat_id: i64,
    chat_title: &'a str,
    streak_count: i64,
    start_date: String,
    end_date: String,
    reason: &'static str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_activity)]
struct DbUserActivity {
    id: i64,
    chat_id: i64,
    user_id: i64,
    username: String,
    activity_count: i64,
    last_activity: String,
}

impl DbUserActivity {
    fn to_user_activity(&self) -> Result<UserActivity, DatabaseError> {
        Ok(UserActivity {
            id: self.id,
            chat_id: self.chat_id,
            user_id: self.user_id,
            username: self.username.clone(),
            activity_count: self.activity_count,
            last_activity: string_to_datetime(&self.last_activity)?,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = user_activity)]
struct NewUserActivity<'a> {
    chat_id: i64,
    user_id: i64,
    username: &'a str,
    activity_count: i64,
    last_activity: String,
}

pub struct SqliteStreakStore {
    db_path: Arc<String>,
}

impl SqliteStreakStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::StreakStore for SqliteStreakStore {
    async fn get_streak(&self, chat_id_param: i64) -> Result<Option<ChatStreak>, DatabaseError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::streaks::dsl::*;
            streaks
                .filter(chat_id.eq(chat_id_param))
                .select(DbChatStreak::as_select())
                .first::<DbChatStreak>(&mut conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(|s| s.to_chat_streak())
                .transpose()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn insert_streak(&self, streak: &ChatStreak) -> Result<bool, DatabaseError> {
        let streak = streak.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let new_streak = NewChatStreak {
                chat_id: streak.chat_id,
                streak_count: streak.streak_count,
                last_activity: datetime_to_string(&streak.last_activity),
                last_user_id: streak.last_user_id,
                last_username: &streak.last_username,
            };

            // insert-or-ignore so a concurrent first event loses cleanly
            diesel::insert_or_ignore_into(streaks::table)
                .values(&new_streak)
                .execute(&mut conn)
                .map(|rows| rows > 0)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn compare_and_swap_streak(
        &self,
        chat_id_param: i64,
        expected_last_activity: DateTime<Utc>,
        replacement: &StreakReplacement,
    ) -> Result<bool, DatabaseError> {
        let replacement = replacement.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::streaks::dsl::*;
            let changes = StreakChangeset {
                streak_count: replacement.streak_count,
                last_activity: datetime_to_string(&replacement.last_activity),
                last_user_id: replacement.last_user_id,
                last_username: &replacement.last_username,
            };

            diesel::update(
                streaks
                    .filter(chat_id.eq(chat_id_param))
                    .filter(last_activity.eq(datetime_to_string(&expected_last_activity))),
            )
            .set(changes)
            .execute(&mut conn)
            .map(|rows| rows > 0)
            .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn delete_streak(&self, chat_id_param: i64) -> Result<bool, DatabaseError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::streaks::dsl::*;
            diesel::delete(streaks.filter(chat_id.eq(chat_id_param)))
                .execute(&mut conn)
                .map(|rows| rows > 0)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

pub struct SqliteHistoryStore {
    db_path: Arc<String>,
}

impl SqliteHistoryStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::HistoryStore for SqliteHistoryStore {
    async fn append_entry(&self, entry: &NewStreakHistoryEntry) -> Result<(), DatabaseError> {
        let entry = entry.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let new_row = NewHistoryRow {
                chat_id: entry.chat_id,
                chat_title: &entry.chat_title,
                streak_count: entry.streak_count,
                start_date: datetime_to_string(&entry.start_date),
                end_date: datetime_to_string(&entry.end_date),
                reason: entry.reason.as_str(),
            };

            diesel::insert_into(streak_history::table)
                .values(&new_row)
                .execute(&mut conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn recent_entries(
        &self,
        chat_id_param: i64,
        limit: i64,
    ) -> Result<Vec<StreakHistoryEntry>, DatabaseError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::streak_history::dsl::*;
            let results = streak_history
                .filter(chat_id.eq(chat_id_param))
                .order((end_date.desc(), id.desc()))
                .limit(limit)
                .select(DbHistoryEntry::as_select())
                .load::<DbHistoryEntry>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            results.into_iter().map(|e| e.to_history_entry()).collect()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn best_streak(&self, chat_id_param: i64) -> Result<Option<i64>, DatabaseError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::streak_history::dsl::*;
            streak_history
                .filter(chat_id.eq(chat_id_param))
                .select(diesel::dsl::max(streak_count))
                .first::<Option<i64>>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

pub struct SqliteActivityStore {
    db_path: Arc<String>,
}

impl SqliteActivityStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::ActivityStore for SqliteActivityStore {
    async fn record_activity(
        &self,
        chat_id_param: i64,
        user_id_param: i64,
        username_param: &str,
        event_time: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let username_param = username_param.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::user_activity::dsl::*;
            let new_row = NewUserActivity {
                chat_id: chat_id_param,
                user_id: user_id_param,
                username: &username_param,
                activity_count: 1,
                last_activity: datetime_to_string(&event_time),
            };

            diesel::insert_into(user_activity)
                .values(&new_row)
                .on_conflict((chat_id, user_id))
                .do_update()
                .set((
                    activity_count.eq(activity_count + 1),
                    username.eq(excluded(username)),
                    last_activity.eq(excluded(last_activity)),
                ))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn top_users(
        &self,
        chat_id_param: i64,
        limit: i64,
    ) -> Result<Vec<UserActivity>, DatabaseError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::user_activity::dsl::*;
            let results = user_activity
                .filter(chat_id.eq(chat_id_param))
                .order(activity_count.desc())
                .limit(limit)
                .select(DbUserActivity::as_select())
                .load::<DbUserActivity>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            results.into_iter().map(|a| a.to_user_activity()).collect()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn total_activity(&self, chat_id_param: i64) -> Result<i64, DatabaseError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            use crate::db::schema_sqlite::user_activity::dsl::*;
            // summed client-side, SQL SUM over BigInt maps to Numeric
            user_activity
                .filter(chat_id.eq(chat_id_param))
                .select(activity_count)
                .load::<i64>(&mut conn)
                .map(|counts| counts.into_iter().sum())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}
