//! Workspace chat cache.
//!
//! Keeps the last chats read for each workspace so listing them does not
//! have to reopen every `state.vscdb`. The cache is a single JSON file.
//!
//! # Invariants
//!
//! - At most one entry per workspace id.
//! - `lastUpdated` strictly increases on every mutation of an entry, even if
//!   the wall clock stalls or steps backwards. A re-read that finds the same
//!   chats is not a mutation; it only moves `lastChecked`.
//! - Freshness is measured from the later of `lastUpdated` and `lastChecked`.
//!   Timestamps from a hand-edited file never overflow; an entry dated in the
//!   future is treated as stale.
//! - Entries leave the cache only through [`WorkspaceCache::evict`],
//!   [`WorkspaceCache::retain_ids`], or [`WorkspaceCache::reset`].
//!
//! Loading is best-effort: a missing or corrupt file yields an empty cache,
//! since everything in it can be rebuilt from the workspace databases.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;

use crate::models::{CacheEntry, Chat, WorkspaceCache};
use crate::prefs::write_atomic;

/// Current time in the unit used by `lastUpdated`.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl WorkspaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    /// Store `chats` for `id`. Returns `false` when the stored chats are
    /// already identical; `lastUpdated` is then left alone and only
    /// `lastChecked` records the re-read.
    pub fn upsert(&mut self, id: &str, chats: Vec<Chat>, now_ms: i64) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) if entry.chats == chats => {
                let checked = entry.last_checked.unwrap_or(entry.last_updated);
                entry.last_checked = Some(now_ms.max(checked));
                false
            }
            Some(entry) => {
                entry.chats = chats;
                entry.last_updated = now_ms.max(entry.last_updated.saturating_add(1));
                entry.last_checked = None;
                true
            }
            None => {
                self.entries.insert(
                    id.to_string(),
                    CacheEntry {
                        chats,
                        last_updated: now_ms,
                        last_checked: None,
                    },
                );
                true
            }
        }
    }

    pub fn evict(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Drop entries whose id is not in `ids`. Returns the evicted ids.
    pub fn retain_ids<'a, I>(&mut self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: HashSet<&str> = ids.into_iter().collect();
        let evicted: Vec<String> = self
            .entries
            .keys()
            .filter(|id| !keep.contains(id.as_str()))
            .cloned()
            .collect();
        for id in &evicted {
            self.entries.remove(id);
        }
        evicted
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Whether `id` was updated or re-checked within `max_age_ms` before
    /// `now_ms`.
    pub fn is_fresh(&self, id: &str, now_ms: i64, max_age_ms: i64) -> bool {
        self.entries.get(id).is_some_and(|entry| {
            let seen = entry.last_updated.max(entry.last_checked.unwrap_or(i64::MIN));
            let age = now_ms.saturating_sub(seen);
            (0..=max_age_ms).contains(&age)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }
}

pub fn load_cache(path: &Path) -> WorkspaceCache {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return WorkspaceCache::new(),
        Err(e) => {
            tracing::warn!("could not read cache {}: {}", path.display(), e);
            return WorkspaceCache::new();
        }
    };

    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!("discarding malformed cache {}: {}", path.display(), e);
        WorkspaceCache::new()
    })
}

pub fn save_cache(path: &Path, cache: &WorkspaceCache) -> Result<()> {
    let json = serde_json::to_string_pretty(cache)?;
    write_atomic(path, &json)
        .with_context(|| format!("Failed to write cache: {}", path.display()))?;
    tracing::debug!("saved {} cache entries to {}", cache.len(), path.display());
    Ok(())
}

/// CLI entry point for `wschat cache list`.
pub fn run_list(path: &Path) -> Result<()> {
    let cache = load_cache(path);
    if cache.is_empty() {
        println!("Cache is empty.");
        return Ok(());
    }

    println!("{:<40} {:>6}  LAST UPDATED", "WORKSPACE", "CHATS");
    for (id, entry) in cache.iter() {
        let updated = chrono::DateTime::from_timestamp_millis(entry.last_updated)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .unwrap_or_else(|| entry.last_updated.to_string());
        println!("{:<40} {:>6}  {}", id, entry.chats.len(), updated);
    }
    Ok(())
}

/// CLI entry point for `wschat cache evict <id>`.
pub fn run_evict(path: &Path, id: &str) -> Result<()> {
    let mut cache = load_cache(path);
    if cache.evict(id) {
        save_cache(path, &cache)?;
        println!("Evicted {}.", id);
    } else {
        println!("{} is not cached.", id);
    }
    Ok(())
}

/// CLI entry point for `wschat cache reset`.
pub fn run_reset(path: &Path) -> Result<()> {
    let mut cache = load_cache(path);
    let count = cache.len();
    cache.reset();
    save_cache(path, &cache)?;
    println!("Removed {} cache entries.", count);
    Ok(())
}
