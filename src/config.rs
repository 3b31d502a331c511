use anyhow::{bail, Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
    #[serde(default = "default_db_file")]
    pub db_file: String,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_db_file() -> String {
    "state.vscdb".to_string()
}

fn default_include_globs() -> Vec<String> {
    vec!["*".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./data/cache.json")
}

fn default_max_age_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreferencesConfig {
    #[serde(default = "default_preferences_path")]
    pub path: PathBuf,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("./data/preferences.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_export_format")]
    pub format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: default_export_format(),
        }
    }
}

fn default_export_format() -> String {
    "markdown".to_string()
}

impl Config {
    /// Defaults for commands that never touch workspace storage.
    pub fn minimal() -> Self {
        Self {
            storage: None,
            cache: CacheConfig::default(),
            preferences: PreferencesConfig::default(),
            export: ExportConfig::default(),
        }
    }

    /// The `[storage]` section, or an error naming what is missing.
    pub fn storage(&self) -> Result<&StorageConfig> {
        self.storage
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Workspace storage not configured: add a [storage] section with `root`"))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if let Some(storage) = &config.storage {
        if storage.db_file.trim().is_empty() {
            bail!("storage.db_file must not be empty");
        }
        for pattern in storage.include_globs.iter().chain(&storage.exclude_globs) {
            Glob::new(pattern).with_context(|| format!("Invalid glob pattern: '{}'", pattern))?;
        }
    }

    match config.export.format.as_str() {
        "markdown" | "json" => {}
        other => bail!(
            "Unknown export format: '{}'. Must be markdown or json.",
            other
        ),
    }

    Ok(config)
}
