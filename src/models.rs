//! Core data models shared by the scanner, reader, cache, and exporter.
//!
//! The serialized field names (`isDirectory`, `lastUpdated`) match the
//! shapes the desktop front end consumes, so a cache file or a `--json`
//! listing can be handed to it unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A discoverable entry (directory or file) in the workspace storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub name: String,
    pub is_directory: bool,
}

/// One question/answer exchange from a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub question: String,
    pub answer: String,
}

/// Cached chats for a single workspace.
///
/// Timestamps are milliseconds since the Unix epoch. `last_updated` moves
/// only when `chats` changes; `last_checked` records a later re-read that
/// found the same chats, and is absent until one happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub chats: Vec<Chat>,
    pub last_updated: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<i64>,
}

/// Workspace id → cached chats. Serialized as a plain JSON object.
///
/// Operations live in [`crate::cache`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceCache {
    pub(crate) entries: BTreeMap<String, CacheEntry>,
}
