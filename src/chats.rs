//! Chat retrieval for a single workspace.
//!
//! Serves from the cache while the entry was updated or re-checked within
//! `cache.max_age_secs`, otherwise reads the workspace database and writes
//! the result back. Used by `wschat chats` and `wschat export`.

use anyhow::Result;

use crate::cache::{self, now_millis};
use crate::config::Config;
use crate::i18n::{MessageKey, Translator};
use crate::models::Chat;
use crate::reader;
use crate::scanner;

/// Chats for the workspace named `name`.
pub async fn workspace_chats(config: &Config, name: &str, force_refresh: bool) -> Result<Vec<Chat>> {
    let storage = config.storage()?;
    let workspace = scanner::find_workspace(storage, name)?;

    let mut cache = cache::load_cache(&config.cache.path);
    let max_age_ms = (config.cache.max_age_secs as i64).saturating_mul(1000);
    let now = now_millis();

    if !force_refresh && max_age_ms > 0 && cache.is_fresh(name, now, max_age_ms) {
        if let Some(entry) = cache.get(name) {
            tracing::debug!("{}: serving {} chats from cache", name, entry.chats.len());
            return Ok(entry.chats.clone());
        }
    }

    let chats = reader::read_chats(&scanner::database_path(storage, &workspace)).await?;

    // Unchanged chats still record the re-read, so the entry is saved either way.
    if !cache.upsert(name, chats.clone(), now) {
        tracing::debug!("{}: chats unchanged since last read", name);
    }
    if let Err(e) = cache::save_cache(&config.cache.path, &cache) {
        tracing::warn!("could not update cache: {:#}", e);
    }

    Ok(chats)
}

/// CLI entry point for `wschat chats`.
pub async fn run_chats(
    config: &Config,
    translator: &Translator,
    name: Option<&str>,
    force_refresh: bool,
    json: bool,
) -> Result<()> {
    let Some(name) = name else {
        println!("{}", translator.t(MessageKey::ChatNoWorkspace));
        return Ok(());
    };

    if atty::is(atty::Stream::Stderr) {
        eprintln!("{}", translator.t(MessageKey::ChatLoading));
    }

    let chats = workspace_chats(config, name, force_refresh).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chats)?);
        return Ok(());
    }

    if chats.is_empty() {
        println!("{}", translator.t(MessageKey::ChatEmpty));
        return Ok(());
    }

    let dialog = translator.t(MessageKey::ChatDialog);
    let question = translator.t(MessageKey::ChatQuestion);
    let answer = translator.t(MessageKey::ChatAnswer);
    for (i, chat) in chats.iter().enumerate() {
        println!("--- {} {} ---", dialog, i + 1);
        println!("[{}]", question);
        println!("{}", chat.question);
        println!("[{}]", answer);
        println!("{}", chat.answer);
        println!();
    }

    if atty::is(atty::Stream::Stderr) {
        eprintln!("{}: wschat export {}", translator.t(MessageKey::ChatExport), name);
    }

    Ok(())
}
