//! Refresh progress reporting.
//!
//! Emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

use crate::i18n::{MessageKey, Translator};

/// A single progress event for `wschat refresh`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshProgressEvent {
    /// Listing the storage root. Total unknown.
    Discovering,
    /// Reading the database of the n-th workspace out of total.
    Reading {
        workspace: String,
        n: u64,
        total: u64,
    },
}

/// Receives progress events from the refresh pipeline.
pub trait RefreshProgressReporter: Send + Sync {
    fn report(&self, event: RefreshProgressEvent);
}

/// Human-friendly progress on stderr: "refresh  reading  12 / 1,034  <workspace>".
pub struct StderrProgress {
    loading_label: String,
}

impl StderrProgress {
    pub fn new(translator: &Translator) -> Self {
        Self {
            loading_label: translator.t(MessageKey::WorkspaceLoading),
        }
    }
}

impl RefreshProgressReporter for StderrProgress {
    fn report(&self, event: RefreshProgressEvent) {
        let line = match &event {
            RefreshProgressEvent::Discovering => format!("refresh  {}\n", self.loading_label),
            RefreshProgressEvent::Reading {
                workspace,
                n,
                total,
            } => format!(
                "refresh  reading  {} / {}  {}\n",
                format_number(*n),
                format_number(*total),
                workspace
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl RefreshProgressReporter for JsonProgress {
    fn report(&self, event: RefreshProgressEvent) {
        let obj = match &event {
            RefreshProgressEvent::Discovering => serde_json::json!({
                "event": "progress",
                "phase": "discovering"
            }),
            RefreshProgressEvent::Reading {
                workspace,
                n,
                total,
            } => serde_json::json!({
                "event": "progress",
                "phase": "reading",
                "workspace": workspace,
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

pub struct NoProgress;

impl RefreshProgressReporter for NoProgress {
    fn report(&self, _event: RefreshProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            _ => None,
        }
    }

    pub fn reporter(&self, translator: &Translator) -> Box<dyn RefreshProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress::new(translator)),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
