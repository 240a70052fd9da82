pub use self::error::DatabaseError;
pub use self::manager::DatabaseManager;
pub use self::models::{
    ChatStreak, NewStreakHistoryEntry, StreakEndReason, StreakHistoryEntry, StreakReplacement,
    UserActivity,
};
pub use self::stores::{ActivityStore, HistoryStore, StreakStore};

pub mod error;
pub mod manager;
pub mod models;
pub mod schema_sqlite;
pub mod sqlite;
pub mod stores;
