//! # Workspace Chats
//!
//! Browse, cache, and export the chat history that VS Code keeps in its
//! per-workspace storage.
//!
//! Every directory under `workspaceStorage` holds a `state.vscdb` SQLite
//! file; the chat panel's sessions live in its `ItemTable` under the
//! `interactive.sessions` key. This crate lists those workspaces, extracts
//! question/answer pairs, keeps them in a JSON cache, and writes exports,
//! with every user-facing string resolved through a small localization table
//! (`zh` by default, `en` as fallback).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//! │  Scanner    │──▶│   Reader    │──▶│    Cache    │
//! │ storage dir │   │ state.vscdb │   │ cache.json  │
//! └─────────────┘   └─────────────┘   └──────┬──────┘
//!                                            │
//!                       ┌────────────────────┤
//!                       ▼                    ▼
//!                  ┌──────────┐        ┌──────────┐
//!                  │   CLI    │        │  Export  │
//!                  │ (wschat) │        │ md/json  │
//!                  └──────────┘        └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | `Workspace`, `Chat`, `WorkspaceCache` |
//! | [`i18n`] | Localization table and `Translator` |
//! | [`prefs`] | Persisted preferences (`preferred-locale`) |
//! | [`scanner`] | Workspace discovery |
//! | [`db`] | Read-only SQLite connection |
//! | [`reader`] | Chat extraction from `state.vscdb` |
//! | [`cache`] | Cache operations and persistence |
//! | [`chats`] | Cache-aware chat retrieval |
//! | [`refresh`] | Bulk cache refresh |
//! | [`progress`] | Refresh progress reporting |
//! | [`export`] | Markdown / JSON export |

pub mod cache;
pub mod chats;
pub mod config;
pub mod db;
pub mod export;
pub mod i18n;
pub mod models;
pub mod prefs;
pub mod progress;
pub mod reader;
pub mod refresh;
pub mod scanner;

#[cfg(test)]
mod testutil;
