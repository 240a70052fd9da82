use std::sync::Arc;

use diesel::Connection;
use diesel::RunQueryDsl;
use diesel::sqlite::SqliteConnection;

use crate::config::DatabaseConfig;
use crate::db::sqlite::{SqliteActivityStore, SqliteHistoryStore, SqliteStreakStore};
use crate::db::{ActivityStore, DatabaseError, HistoryStore, StreakStore};

#[derive(Clone)]
pub struct DatabaseManager {
    db_path: Arc<String>,
    streak_store: Arc<dyn StreakStore>,
    history_store: Arc<dyn HistoryStore>,
    activity_store: Arc<dyn ActivityStore>,
}

impl DatabaseManager {
    pub fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if config.filename.is_empty() {
            return Err(DatabaseError::Connection(
                "database filename is empty".to_string(),
            ));
        }

        let db_path = Arc::new(config.filename.clone());
        Ok(Self {
            streak_store: Arc::new(SqliteStreakStore::new(db_path.clone())),
            history_store: Arc::new(SqliteHistoryStore::new(db_path.clone())),
            activity_store: Arc::new(SqliteActivityStore::new(db_path.clone())),
            db_path,
        })
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        let path = self.db_path.as_ref().clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = SqliteConnection::establish(&path)
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            let statements = [
                r#"
                CREATE TABLE IF NOT EXISTS streaks (
                    chat_id BIGINT PRIMARY KEY NOT NULL,
                    streak_count BIGINT NOT NULL DEFAULT 1,
                    last_activity TEXT NOT NULL,
                    last_user_id BIGINT NOT NULL,
                    last_username TEXT NOT NULL
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS streak_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    chat_id BIGINT NOT NULL,
                    chat_title TEXT NOT NULL,
                    streak_count BIGINT NOT NULL,
                    start_date TEXT NOT NULL,
                    end_date TEXT NOT NULL,
                    reason TEXT NOT NULL
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS user_activity (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    chat_id BIGINT NOT NULL,
                    user_id BIGINT NOT NULL,
                    username TEXT NOT NULL,
                    activity_count BIGINT NOT NULL DEFAULT 1,
                    last_activity TEXT NOT NULL
                )
                "#,
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_user_activity_chat_user ON user_activity(chat_id, user_id)",
                "CREATE INDEX IF NOT EXISTS idx_streak_history_chat_id ON streak_history(chat_id)",
                "CREATE INDEX IF NOT EXISTS idx_streak_history_end_date ON streak_history(end_date)",
            ];

            for statement in statements {
                diesel::sql_query(statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    pub fn streak_store(&self) -> Arc<dyn StreakStore> {
        self.streak_store.clone()
    }

    pub fn history_store(&self) -> Arc<dyn HistoryStore> {
        self.history_store.clone()
    }

    pub fn activity_store(&self) -> Arc<dyn ActivityStore> {
        self.activity_store.clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tempfile::NamedTempFile;

    use super::DatabaseManager;
    use crate::config::DatabaseConfig;
    use crate::db::{ChatStreak, NewStreakHistoryEntry, StreakEndReason, StreakReplacement};

    async fn test_manager(file: &NamedTempFile) -> DatabaseManager {
        let config = DatabaseConfig {
            filename: file.path().to_string_lossy().to_string(),
        };
        let manager = DatabaseManager::new(&config).expect("db manager");
        manager.migrate().await.expect("migrate");
        manager
    }

    fn streak(chat_id: i64, count: i64, last_activity: chrono::DateTime<Utc>) -> ChatStreak {
        ChatStreak {
            chat_id,
            streak_count: count,
            last_activity,
            last_user_id: 7,
            last_username: "alice".to_string(),
        }
    }

    #[tokio::test]
    async fn streak_insert_swap_delete_roundtrip() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = test_manager(&file).await;
        let store = manager.streak_store();
        let t0 = Utc::now();

        assert!(store.get_streak(100).await.expect("get").is_none());
        assert!(store.insert_streak(&streak(100, 1, t0)).await.expect("insert"));
        // second insert for the same chat must be a no-op
        assert!(!store.insert_streak(&streak(100, 1, t0)).await.expect("reinsert"));

        let current = store
            .get_streak(100)
            .await
            .expect("get")
            .expect("streak exists");
        assert_eq!(current.streak_count, 1);
        assert_eq!(current.last_username, "alice");

        let t1 = t0 + Duration::hours(1);
        let replacement = StreakReplacement {
            streak_count: 2,
            last_activity: t1,
            last_user_id: 8,
            last_username: "bob".to_string(),
        };
        assert!(
            store
                .compare_and_swap_streak(100, t0, &replacement)
                .await
                .expect("swap")
        );
        // guard value is stale now, a second swap must fail
        assert!(
            !store
                .compare_and_swap_streak(100, t0, &replacement)
                .await
                .expect("stale swap")
        );

        let advanced = store
            .get_streak(100)
            .await
            .expect("get")
            .expect("streak exists");
        assert_eq!(advanced.streak_count, 2);
        assert_eq!(advanced.last_username, "bob");

        assert!(store.delete_streak(100).await.expect("delete"));
        assert!(!store.delete_streak(100).await.expect("redelete"));
        assert!(store.get_streak(100).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn history_append_query_and_best() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = test_manager(&file).await;
        let store = manager.history_store();
        let now = Utc::now();

        assert!(store.best_streak(100).await.expect("best").is_none());

        for (count, days_ago, reason) in [
            (4, 3, StreakEndReason::Timeout),
            (9, 2, StreakEndReason::ManualReset),
            (2, 1, StreakEndReason::Timeout),
        ] {
            store
                .append_entry(&NewStreakHistoryEntry {
                    chat_id: 100,
                    chat_title: "test chat".to_string(),
                    streak_count: count,
                    start_date: now - Duration::days(days_ago) - Duration::hours(1),
                    end_date: now - Duration::days(days_ago),
                    reason,
                })
                .await
                .expect("append");
        }

        let entries = store.recent_entries(100, 2).await.expect("recent");
        assert_eq!(entries.len(), 2);
        // newest first
        assert_eq!(entries[0].streak_count, 2);
        assert_eq!(entries[1].streak_count, 9);
        assert_eq!(entries[1].reason, StreakEndReason::ManualReset);

        assert_eq!(store.best_streak(100).await.expect("best"), Some(9));
        assert!(store.best_streak(999).await.expect("best other").is_none());
    }

    #[tokio::test]
    async fn activity_upsert_increments_and_updates_username() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = test_manager(&file).await;
        let store = manager.activity_store();
        let t0 = Utc::now();

        assert_eq!(store.total_activity(100).await.expect("total"), 0);

        store
            .record_activity(100, 7, "alice", t0)
            .await
            .expect("first event");
        store
            .record_activity(100, 7, "alice_renamed", t0 + Duration::minutes(5))
            .await
            .expect("second event");
        store
            .record_activity(100, 8, "bob", t0 + Duration::minutes(10))
            .await
            .expect("other user");

        let top = store.top_users(100, 10).await.expect("top");
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].user_id, 7);
        assert_eq!(top[0].activity_count, 2);
        assert_eq!(top[0].username, "alice_renamed");
        assert_eq!(top[1].user_id, 8);
        assert_eq!(top[1].activity_count, 1);

        assert_eq!(store.total_activity(100).await.expect("total"), 3);
        assert_eq!(store.total_activity(999).await.expect("other chat"), 0);
    }
}
