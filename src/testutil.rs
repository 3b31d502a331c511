//! Fixtures shared by unit tests.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::SqlitePool;
use std::path::Path;

use crate::reader::SESSIONS_KEY;

/// Create a minimal `state.vscdb` with an `ItemTable`, optionally holding
/// an `interactive.sessions` value.
pub async fn create_state_db(path: &Path, sessions: Option<&str>) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);
    let pool = SqlitePool::connect_with(options).await.unwrap();
    sqlx::query("CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB)")
        .execute(&pool)
        .await
        .unwrap();
    if let Some(sessions) = sessions {
        sqlx::query("INSERT INTO ItemTable (key, value) VALUES (?, ?)")
            .bind(SESSIONS_KEY)
            .bind(sessions)
            .execute(&pool)
            .await
            .unwrap();
    }
    pool.close().await;
}

/// One-session `interactive.sessions` value with the given exchanges.
pub fn sessions_json(pairs: &[(&str, &str)]) -> String {
    let requests: Vec<serde_json::Value> = pairs
        .iter()
        .map(|(q, a)| {
            serde_json::json!({
                "message": { "text": q },
                "response": [{ "value": a }]
            })
        })
        .collect();
    serde_json::json!([{ "requests": requests }]).to_string()
}
