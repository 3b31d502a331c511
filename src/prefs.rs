//! Persisted user preferences.
//!
//! A flat JSON object of string keys to string values, kept in a single
//! file. Reads are best-effort: a missing or corrupt file behaves like an
//! empty store, so start-up never fails because of it.

use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::i18n::{Locale, Translator};

/// Key under which the preferred UI locale is stored.
pub const PREFERRED_LOCALE_KEY: &str = "preferred-locale";

/// Read-only view of a key-value preference source.
pub trait PreferenceSource {
    fn get(&self, key: &str) -> Option<String>;
}

impl PreferenceSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// File-backed preference store.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl PreferenceStore {
    /// Open the store at `path`. Never fails; see the module docs.
    pub fn open(path: &Path) -> Self {
        let values = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(
                        "ignoring malformed preferences file {}: {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("could not read preferences {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            values,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a value and write the file.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()
    }

    /// Remove a value and write the file. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let removed = self.values.remove(key).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.values)?;
        write_atomic(&self.path, &json)
            .with_context(|| format!("Failed to write preferences: {}", self.path.display()))
    }
}

impl PreferenceSource for PreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// CLI entry point for `wschat locale show`.
pub fn run_locale_show(store: &PreferenceStore, translator: &Translator) -> Result<()> {
    match store.get(PREFERRED_LOCALE_KEY) {
        Some(saved) => println!("saved:    {}", saved),
        None => println!("saved:    (none, default {})", Locale::DEFAULT),
    }
    println!("active:   {}", translator.active_locale());
    println!("fallback: {}", translator.fallback_locale());
    println!("file:     {}", store.path().display());
    Ok(())
}

/// CLI entry point for `wschat locale set <tag>`.
pub fn run_locale_set(store: &mut PreferenceStore, tag: &str) -> Result<()> {
    let Some(locale) = Locale::parse(tag) else {
        let supported: Vec<&str> = Locale::ALL.iter().map(|l| l.as_str()).collect();
        bail!(
            "Unsupported locale: '{}'. Supported: {}",
            tag,
            supported.join(", ")
        );
    };
    store.set(PREFERRED_LOCALE_KEY, locale.as_str())?;
    println!("Locale set to {}.", locale);
    Ok(())
}

/// CLI entry point for `wschat locale unset`.
pub fn run_locale_unset(store: &mut PreferenceStore) -> Result<()> {
    if store.remove(PREFERRED_LOCALE_KEY)? {
        println!("Locale preference cleared; default is {}.", Locale::DEFAULT);
    } else {
        println!("No locale preference saved.");
    }
    Ok(())
}

/// Write `content` to a sibling temp file, then rename it over `path`.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
