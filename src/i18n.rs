//! Localized UI strings.
//!
//! Strings are addressed by a dotted key path (`namespace.key`) and resolved
//! against the active locale first, then the fallback locale (`en`). Templates
//! may contain `{name}` placeholders that are substituted at display time.
//!
//! # Invariants
//!
//! 1. The built-in `zh` and `en` tables carry the same key paths.
//! 2. A [`Translator`] is immutable after construction, so it can be shared
//!    across threads freely.
//! 3. Resolution never fails: a key unknown to every table resolves to its
//!    own key path.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Key missing in active locale | Fallback locale is consulted |
//! | Key missing everywhere | Raw key path returned, warning logged |
//! | Unrecognized active locale | Every lookup goes to the fallback |
//! | `{name}` without a value | Token left as-is |

use std::collections::BTreeMap;
use std::fmt;

use crate::prefs::{PreferenceSource, PREFERRED_LOCALE_KEY};

/// Locales with a built-in string table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Locale {
    Zh,
    En,
}

impl Locale {
    /// Used when no preference has been saved.
    pub const DEFAULT: Locale = Locale::Zh;
    /// Consulted when the active locale lacks a key.
    pub const FALLBACK: Locale = Locale::En;
    pub const ALL: [Locale; 2] = [Locale::Zh, Locale::En];

    pub const fn as_str(self) -> &'static str {
        match self {
            Locale::Zh => "zh",
            Locale::En => "en",
        }
    }

    /// Parse a locale tag, ignoring case and any region suffix
    /// (`zh-CN`, `en_US`).
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let base = normalized
            .split(['-', '_'])
            .next()
            .unwrap_or_default();
        match base {
            "zh" => Some(Locale::Zh),
            "en" => Some(Locale::En),
            _ => None,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key namespaces.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Namespace {
    Workspace,
    Chat,
    Dialog,
}

impl Namespace {
    pub const fn as_str(self) -> &'static str {
        match self {
            Namespace::Workspace => "workspace",
            Namespace::Chat => "chat",
            Namespace::Dialog => "dialog",
        }
    }
}

/// Every message the application displays.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MessageKey {
    WorkspaceFind,
    WorkspaceRefresh,
    WorkspaceEmpty,
    WorkspaceLoading,
    ChatDialog,
    ChatQuestion,
    ChatAnswer,
    ChatExport,
    ChatEmpty,
    ChatNoWorkspace,
    ChatLoading,
    DialogGetWorkspaceListFail,
    DialogExportTitle,
    DialogExportSuccess,
    DialogExportFail,
    DialogRefreshSuccess,
    DialogRefreshFail,
    DialogClose,
    DialogCancel,
}

impl MessageKey {
    pub const ALL: [MessageKey; 19] = [
        MessageKey::WorkspaceFind,
        MessageKey::WorkspaceRefresh,
        MessageKey::WorkspaceEmpty,
        MessageKey::WorkspaceLoading,
        MessageKey::ChatDialog,
        MessageKey::ChatQuestion,
        MessageKey::ChatAnswer,
        MessageKey::ChatExport,
        MessageKey::ChatEmpty,
        MessageKey::ChatNoWorkspace,
        MessageKey::ChatLoading,
        MessageKey::DialogGetWorkspaceListFail,
        MessageKey::DialogExportTitle,
        MessageKey::DialogExportSuccess,
        MessageKey::DialogExportFail,
        MessageKey::DialogRefreshSuccess,
        MessageKey::DialogRefreshFail,
        MessageKey::DialogClose,
        MessageKey::DialogCancel,
    ];

    pub const fn namespace(self) -> Namespace {
        match self {
            MessageKey::WorkspaceFind
            | MessageKey::WorkspaceRefresh
            | MessageKey::WorkspaceEmpty
            | MessageKey::WorkspaceLoading => Namespace::Workspace,
            MessageKey::ChatDialog
            | MessageKey::ChatQuestion
            | MessageKey::ChatAnswer
            | MessageKey::ChatExport
            | MessageKey::ChatEmpty
            | MessageKey::ChatNoWorkspace
            | MessageKey::ChatLoading => Namespace::Chat,
            _ => Namespace::Dialog,
        }
    }

    /// Leaf key within the namespace.
    pub const fn leaf(self) -> &'static str {
        match self {
            MessageKey::WorkspaceFind => "find",
            MessageKey::WorkspaceRefresh => "refresh",
            MessageKey::WorkspaceEmpty => "empty",
            MessageKey::WorkspaceLoading => "loading",
            MessageKey::ChatDialog => "dialog",
            MessageKey::ChatQuestion => "question",
            MessageKey::ChatAnswer => "answer",
            MessageKey::ChatExport => "export",
            MessageKey::ChatEmpty => "empty",
            MessageKey::ChatNoWorkspace => "noWorkspace",
            MessageKey::ChatLoading => "loading",
            MessageKey::DialogGetWorkspaceListFail => "getWorkspaceListFail",
            MessageKey::DialogExportTitle => "exportTitle",
            MessageKey::DialogExportSuccess => "exportSuccess",
            MessageKey::DialogExportFail => "exportFail",
            MessageKey::DialogRefreshSuccess => "refreshSuccess",
            MessageKey::DialogRefreshFail => "refreshFail",
            MessageKey::DialogClose => "close",
            MessageKey::DialogCancel => "cancel",
        }
    }

    /// Dotted key path, e.g. `dialog.exportFail`.
    pub fn path(self) -> String {
        format!("{}.{}", self.namespace().as_str(), self.leaf())
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let (ns, leaf) = path.split_once('.')?;
        Self::ALL
            .into_iter()
            .find(|k| k.namespace().as_str() == ns && k.leaf() == leaf)
    }
}

type Table = &'static [(&'static str, &'static [(&'static str, &'static str)])];

const EN_WORKSPACE: &[(&str, &str)] = &[
    ("find", "Find Workspaces"),
    ("refresh", "Refresh"),
    ("empty", "No workspaces found"),
    ("loading", "Loading workspaces..."),
];

const EN_CHAT: &[(&str, &str)] = &[
    ("dialog", "Dialog"),
    ("question", "Question"),
    ("answer", "Answer"),
    ("export", "Export"),
    ("empty", "No chat records"),
    ("noWorkspace", "Select a workspace to view chat records"),
    ("loading", "Loading..."),
];

const EN_DIALOG: &[(&str, &str)] = &[
    ("getWorkspaceListFail", "Get workspace list failed: {error}"),
    ("exportTitle", "Select Export Directory"),
    ("exportSuccess", "Export Success"),
    ("exportFail", "Export Failed: {error}"),
    ("refreshSuccess", "Refresh Success"),
    ("refreshFail", "Refresh Failed: {error}"),
    ("close", "Close"),
    ("cancel", "Cancel"),
];

const ZH_WORKSPACE: &[(&str, &str)] = &[
    ("find", "查找工作区"),
    ("refresh", "刷新工作区目录"),
    ("empty", "没有找到工作区"),
    ("loading", "加载工作区中..."),
];

const ZH_CHAT: &[(&str, &str)] = &[
    ("dialog", "对话"),
    ("question", "问题"),
    ("answer", "回答"),
    ("export", "导出"),
    ("empty", "当前工作区没有聊天记录"),
    ("noWorkspace", "选择工作区以查看聊天记录"),
    ("loading", "加载中..."),
];

const ZH_DIALOG: &[(&str, &str)] = &[
    ("getWorkspaceListFail", "获取工作区列表失败：{error}"),
    ("exportTitle", "选择导出目录"),
    ("exportSuccess", "导出成功"),
    ("exportFail", "导出失败：{error}"),
    ("refreshSuccess", "刷新成功"),
    ("refreshFail", "刷新失败：{error}"),
    ("close", "关闭"),
    ("cancel", "取消"),
];

const EN: Table = &[
    ("workspace", EN_WORKSPACE),
    ("chat", EN_CHAT),
    ("dialog", EN_DIALOG),
];

const ZH: Table = &[
    ("workspace", ZH_WORKSPACE),
    ("chat", ZH_CHAT),
    ("dialog", ZH_DIALOG),
];

/// Strings for a single locale: namespace → key → template.
#[derive(Debug, Clone, Default)]
pub struct LocaleTable {
    namespaces: BTreeMap<String, BTreeMap<String, String>>,
}

impl LocaleTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_static(table: Table) -> Self {
        let mut out = Self::new();
        for (ns, entries) in table {
            for (key, template) in entries.iter() {
                out.insert(ns, key, *template);
            }
        }
        out
    }

    pub fn insert(&mut self, namespace: &str, key: &str, template: impl Into<String>) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), template.into());
    }

    /// Look up a dotted key path.
    pub fn get(&self, path: &str) -> Option<&str> {
        let (ns, key) = path.split_once('.')?;
        self.namespaces
            .get(ns)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    /// All dotted key paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.namespaces
            .iter()
            .flat_map(|(ns, entries)| entries.keys().map(move |key| format!("{}.{}", ns, key)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Key parity of one locale against the union of all keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleCoverage {
    pub locale: String,
    pub present: usize,
    pub missing: Vec<String>,
}

/// All locale tables known to the application.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    locales: BTreeMap<String, LocaleTable>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shipped `zh` and `en` tables.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.add_locale(Locale::Zh.as_str(), LocaleTable::from_static(ZH));
        catalog.add_locale(Locale::En.as_str(), LocaleTable::from_static(EN));
        catalog
    }

    pub fn add_locale(&mut self, locale: impl Into<String>, table: LocaleTable) {
        self.locales.insert(locale.into(), table);
    }

    pub fn table(&self, locale: &str) -> Option<&LocaleTable> {
        self.locales.get(locale)
    }

    /// Lookup in one locale only; no fallback.
    pub fn get(&self, locale: &str, path: &str) -> Option<&str> {
        self.locales.get(locale).and_then(|t| t.get(path))
    }

    pub fn locales(&self) -> Vec<&str> {
        self.locales.keys().map(String::as_str).collect()
    }

    /// Key paths of `reference` that `target` does not define.
    pub fn missing_keys(&self, reference: &str, target: &str) -> Vec<String> {
        let Some(reference) = self.locales.get(reference) else {
            return Vec::new();
        };
        reference
            .paths()
            .into_iter()
            .filter(|path| self.get(target, path).is_none())
            .collect()
    }

    /// Check every locale against the union of all key paths.
    pub fn coverage(&self) -> Vec<LocaleCoverage> {
        let mut all: Vec<String> = self.locales.values().flat_map(LocaleTable::paths).collect();
        all.sort_unstable();
        all.dedup();

        self.locales
            .iter()
            .map(|(tag, table)| {
                let missing: Vec<String> = all
                    .iter()
                    .filter(|path| table.get(path).is_none())
                    .cloned()
                    .collect();
                LocaleCoverage {
                    locale: tag.clone(),
                    present: all.len() - missing.len(),
                    missing,
                }
            })
            .collect()
    }
}

/// Resolves display strings for one active locale.
///
/// Build once at start-up and pass by reference to whatever prints
/// user-facing text.
#[derive(Debug, Clone)]
pub struct Translator {
    catalog: Catalog,
    active: String,
    fallback: Locale,
}

impl Translator {
    /// Translator over the built-in tables.
    ///
    /// `active` may be any tag. Recognized tags are normalized (`zh-CN` →
    /// `zh`); anything else is kept verbatim and resolves via the fallback.
    /// A blank tag selects [`Locale::DEFAULT`].
    pub fn new(active: &str) -> Self {
        Self::with_catalog(Catalog::builtin(), active)
    }

    pub fn with_catalog(catalog: Catalog, active: &str) -> Self {
        let active = if active.trim().is_empty() {
            Locale::DEFAULT.as_str().to_string()
        } else {
            match Locale::parse(active) {
                Some(locale) => locale.as_str().to_string(),
                None => {
                    tracing::debug!("locale '{}' has no table, using fallback", active);
                    active.trim().to_string()
                }
            }
        };

        Self {
            catalog,
            active,
            fallback: Locale::FALLBACK,
        }
    }

    /// Select the locale saved under `preferred-locale`, or the default.
    pub fn from_preferences(source: &dyn PreferenceSource) -> Self {
        let saved = source.get(PREFERRED_LOCALE_KEY).unwrap_or_default();
        Self::new(&saved)
    }

    pub fn active_locale(&self) -> &str {
        &self.active
    }

    pub fn fallback_locale(&self) -> Locale {
        self.fallback
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Raw template for `path`, active locale first, then fallback.
    pub fn lookup(&self, path: &str) -> Option<&str> {
        self.catalog
            .get(&self.active, path)
            .or_else(|| self.catalog.get(self.fallback.as_str(), path))
    }

    /// Resolve and interpolate `path`. Unknown paths come back unchanged.
    pub fn translate(&self, path: &str, params: &[(&str, &str)]) -> String {
        match self.lookup(path) {
            Some(template) => interpolate(template, params),
            None => {
                tracing::warn!("missing translation for '{}'", path);
                path.to_string()
            }
        }
    }

    pub fn t(&self, key: MessageKey) -> String {
        self.translate(&key.path(), &[])
    }

    pub fn t_with(&self, key: MessageKey, params: &[(&str, &str)]) -> String {
        self.translate(&key.path(), params)
    }
}

/// CLI entry point for `wschat i18n check`. Fails when any locale lacks a key.
pub fn run_check(translator: &Translator) -> anyhow::Result<()> {
    let report = translator.catalog().coverage();
    let mut gaps = 0;
    for coverage in &report {
        println!(
            "{:<6} {:>3} keys  {} missing",
            coverage.locale,
            coverage.present,
            coverage.missing.len()
        );
        for path in &coverage.missing {
            println!("         - {}", path);
        }
        gaps += coverage.missing.len();
    }
    if gaps > 0 {
        anyhow::bail!("{} missing translations", gaps);
    }
    Ok(())
}

/// CLI entry point for `wschat i18n get <key>`.
pub fn run_get(translator: &Translator, path: &str, params: &[(String, String)]) -> anyhow::Result<()> {
    let params: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    println!("{}", translator.translate(path, &params));
    Ok(())
}

/// Replace `{name}` tokens in one pass. Tokens without a matching param and
/// unclosed braces are copied through unchanged.
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars();

    while let Some(ch) = chars.next() {
        if ch != '{' {
            result.push(ch);
            continue;
        }

        let mut token = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            token.push(c);
        }

        if !closed {
            result.push('{');
            result.push_str(&token);
            continue;
        }

        match params.iter().find(|(name, _)| *name == token) {
            Some((_, value)) => result.push_str(value),
            None => {
                result.push('{');
                result.push_str(&token);
                result.push('}');
            }
        }
    }

    result
}
