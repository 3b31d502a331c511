//! Bulk refresh of the chat cache.
//!
//! Scans the storage root, reads every workspace database, and brings the
//! cache in line: changed chats are upserted, unchanged ones left alone, and
//! entries for workspaces that no longer exist are evicted. A workspace
//! whose database is missing or unreadable is skipped, not fatal.

use anyhow::Result;

use crate::cache::{self, now_millis};
use crate::config::Config;
use crate::i18n::{MessageKey, Translator};
use crate::models::WorkspaceCache;
use crate::progress::{RefreshProgressEvent, RefreshProgressReporter};
use crate::reader;
use crate::scanner;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub scanned: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub evicted: usize,
}

pub async fn refresh_all(
    config: &Config,
    cache: &mut WorkspaceCache,
    reporter: &dyn RefreshProgressReporter,
) -> Result<RefreshSummary> {
    let storage = config.storage()?;

    reporter.report(RefreshProgressEvent::Discovering);
    let workspaces = scanner::scan_workspaces(storage)?;

    let mut summary = RefreshSummary {
        scanned: workspaces.len(),
        ..Default::default()
    };
    let total = workspaces.len() as u64;

    for (i, ws) in workspaces.iter().enumerate() {
        reporter.report(RefreshProgressEvent::Reading {
            workspace: ws.name.clone(),
            n: i as u64 + 1,
            total,
        });

        let db_path = scanner::database_path(storage, ws);
        if !db_path.is_file() {
            tracing::debug!("{}: no database at {}", ws.name, db_path.display());
            summary.skipped += 1;
            continue;
        }

        match reader::read_chats(&db_path).await {
            Ok(chats) => {
                if cache.upsert(&ws.name, chats, now_millis()) {
                    summary.updated += 1;
                } else {
                    summary.unchanged += 1;
                }
            }
            Err(e) => {
                tracing::warn!("{}: skipping unreadable database: {:#}", ws.name, e);
                summary.skipped += 1;
            }
        }
    }

    summary.evicted = cache
        .retain_ids(workspaces.iter().map(|ws| ws.name.as_str()))
        .len();

    Ok(summary)
}

/// CLI entry point for `wschat refresh`.
pub async fn run_refresh(
    config: &Config,
    translator: &Translator,
    reporter: &dyn RefreshProgressReporter,
) -> Result<()> {
    let mut cache = cache::load_cache(&config.cache.path);
    let summary = refresh_all(config, &mut cache, reporter).await?;
    cache::save_cache(&config.cache.path, &cache)?;

    println!("{}", translator.t(MessageKey::DialogRefreshSuccess));
    println!("  scanned: {}", summary.scanned);
    println!("  updated: {}", summary.updated);
    println!("  unchanged: {}", summary.unchanged);
    println!("  skipped: {}", summary.skipped);
    println!("  evicted: {}", summary.evicted);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::models::Chat;
    use crate::progress::NoProgress;
    use crate::testutil::{create_state_db, sessions_json};
    use std::path::Path;
    use tempfile::TempDir;

    fn config_for(root: &Path) -> Config {
        let mut config = Config::minimal();
        config.storage = Some(StorageConfig {
            root: root.to_path_buf(),
            db_file: "state.vscdb".to_string(),
            include_globs: vec!["*".to_string()],
            exclude_globs: vec![],
            follow_symlinks: false,
        });
        config
    }

    #[tokio::test]
    async fn refresh_updates_skips_and_evicts() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        create_state_db(
            &root.join("alpha").join("state.vscdb"),
            Some(sessions_json(&[("q1", "a1")]).as_str()),
        )
        .await;
        std::fs::create_dir(root.join("empty-dir")).unwrap();

        let mut cache = WorkspaceCache::new();
        cache.upsert("gone", vec![], 1);

        let config = config_for(root);
        let summary = refresh_all(&config, &mut cache, &NoProgress).await.unwrap();

        assert_eq!(
            summary,
            RefreshSummary {
                scanned: 2,
                updated: 1,
                unchanged: 0,
                skipped: 1,
                evicted: 1,
            }
        );
        assert_eq!(
            cache.get("alpha").unwrap().chats,
            vec![Chat {
                question: "q1".to_string(),
                answer: "a1".to_string()
            }]
        );
        assert!(cache.get("gone").is_none());

        let again = refresh_all(&config, &mut cache, &NoProgress).await.unwrap();
        assert_eq!(again.updated, 0);
        assert_eq!(again.unchanged, 1);
    }

    #[tokio::test]
    async fn refresh_without_storage_fails() {
        let mut cache = WorkspaceCache::new();
        let err = refresh_all(&Config::minimal(), &mut cache, &NoProgress)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
