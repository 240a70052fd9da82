diesel::table! {
    streaks (chat_id) {
        chat_id -> BigInt,
        streak_count -> BigInt,
        last_activity -> Text,
        last_user_id -> BigInt,
        last_username -> Text,
    }
}

diesel::table! {
    streak_history (id) {
        id -> BigInt,
        chat_id -> BigInt,
        chat_title -> Text,
        streak_count -> BigInt,
        start_date -> Text,
        end_date -> Text,
        reason -> Text,
    }
}

diesel::table! {
    user_activity (id) {
        id -> BigInt,
        chat_id -> BigInt,
        user_id -> BigInt,
        username -> Text,
        activity_count -> BigInt,
        last_activity -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(streaks, streak_history, user_activity);
