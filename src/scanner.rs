//! Workspace discovery.
//!
//! Lists the direct children of the configured storage root. In VS Code's
//! `workspaceStorage` every child is a hashed directory holding a
//! `state.vscdb`; a bare database file dropped into the root is listed too.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::config::StorageConfig;
use crate::i18n::{MessageKey, Translator};
use crate::models::Workspace;

pub fn scan_workspaces(storage: &StorageConfig) -> Result<Vec<Workspace>> {
    let root = &storage.root;
    if !root.is_dir() {
        bail!("Workspace storage root does not exist: {}", root.display());
    }

    let include_set = build_globset(&storage.include_globs)?;
    let exclude_set = build_globset(&storage.exclude_globs)?;

    let mut workspaces = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(storage.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();

        if name.starts_with('.') || exclude_set.is_match(&name) || !include_set.is_match(&name) {
            continue;
        }

        workspaces.push(Workspace {
            name,
            is_directory: entry.file_type().is_dir(),
        });
    }

    workspaces.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!("found {} workspaces under {}", workspaces.len(), root.display());

    Ok(workspaces)
}

/// Path of the chat database backing `workspace`.
pub fn database_path(storage: &StorageConfig, workspace: &Workspace) -> PathBuf {
    let entry = storage.root.join(&workspace.name);
    if workspace.is_directory {
        entry.join(&storage.db_file)
    } else {
        entry
    }
}

/// Find a workspace by exact name.
pub fn find_workspace(storage: &StorageConfig, name: &str) -> Result<Workspace> {
    scan_workspaces(storage)?
        .into_iter()
        .find(|ws| ws.name == name)
        .ok_or_else(|| anyhow::anyhow!("workspace not found: {}", name))
}

/// CLI entry point for `wschat workspaces`.
pub fn run_list(
    storage: &StorageConfig,
    translator: &Translator,
    json: bool,
) -> Result<()> {
    let workspaces = scan_workspaces(storage)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workspaces)?);
        return Ok(());
    }

    println!("{}", translator.t(MessageKey::WorkspaceFind));
    if workspaces.is_empty() {
        println!("{}", translator.t(MessageKey::WorkspaceEmpty));
        return Ok(());
    }

    for ws in &workspaces {
        let kind = if ws.is_directory { "dir " } else { "file" };
        println!("  {}  {}", kind, ws.name);
    }

    Ok(())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
