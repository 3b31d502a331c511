//! Chat history extraction from a workspace's `state.vscdb`.
//!
//! VS Code keeps its key-value state in an SQLite table named `ItemTable`.
//! The chat panel stores its sessions under the `interactive.sessions` key
//! as a JSON array:
//!
//! ```text
//! [ { "requests": [ { "message":  { "text": "<question>" },
//!                     "response": [ { "value": "<answer>" }, ... ] },
//!                   ... ] },
//!   ... ]
//! ```
//!
//! Only the first session is read. Requests lacking either side of the
//! exchange are skipped rather than reported.

use anyhow::{bail, Result};
use serde_json::Value;
use sqlx::Row;
use std::path::Path;

use crate::db;
use crate::models::Chat;

/// `ItemTable` key holding the chat sessions.
pub const SESSIONS_KEY: &str = "interactive.sessions";

pub async fn read_chats(db_path: &Path) -> Result<Vec<Chat>> {
    if !db_path.is_file() {
        bail!("workspace database does not exist: {}", db_path.display());
    }

    let pool = db::connect_readonly(db_path).await?;

    let rows = sqlx::query("SELECT CAST(value AS TEXT) AS value FROM ItemTable WHERE key = ?")
        .bind(SESSIONS_KEY)
        .fetch_all(&pool)
        .await;
    pool.close().await;
    let rows = rows?;

    let mut chats = Vec::new();
    for row in &rows {
        let value: Option<String> = match row.try_get("value") {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("{}: skipping undecodable sessions value: {}", db_path.display(), e);
                continue;
            }
        };
        if let Some(value) = value {
            chats.extend(parse_sessions(&value));
        }
    }

    tracing::debug!("read {} chats from {}", chats.len(), db_path.display());
    Ok(chats)
}

/// Extract question/answer pairs from an `interactive.sessions` value.
pub fn parse_sessions(json: &str) -> Vec<Chat> {
    let data: Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("skipping malformed chat sessions: {}", e);
            return Vec::new();
        }
    };

    let requests = data
        .as_array()
        .and_then(|sessions| sessions.first())
        .and_then(|session| session.get("requests"))
        .and_then(Value::as_array);

    let Some(requests) = requests else {
        return Vec::new();
    };

    requests
        .iter()
        .filter_map(|request| {
            let question = request
                .get("message")
                .and_then(|m| m.get("text"))
                .and_then(Value::as_str)?;
            let answer = request
                .get("response")
                .and_then(Value::as_array)
                .and_then(|parts| parts.first())
                .and_then(|part| part.get("value"))
                .and_then(Value::as_str)?;
            Some(Chat {
                question: question.to_string(),
                answer: answer.to_string(),
            })
        })
        .collect()
}
