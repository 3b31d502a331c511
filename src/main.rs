//! # Workspace Chats CLI (`wschat`)
//!
//! Lists VS Code workspace storage entries, shows the chat history stored in
//! each workspace's `state.vscdb`, caches it, and exports it. All user-facing
//! messages go through the localization table; the active locale comes from
//! the saved preference (`wschat locale set en`) or `--locale`.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wschat workspaces` | List workspaces under `[storage].root` |
//! | `wschat chats <ws>` | Show the chats of one workspace |
//! | `wschat export <ws>` | Export chats as Markdown or JSON |
//! | `wschat refresh` | Re-read every workspace into the cache |
//! | `wschat cache list\|evict\|reset` | Inspect or clear the cache |
//! | `wschat locale show\|set\|unset` | Manage the saved UI locale |
//! | `wschat i18n get\|check` | Resolve a key or check translation parity |
//!
//! ## Examples
//!
//! ```bash
//! wschat --config ./config/wschat.toml workspaces
//! wschat chats 3f2a9c0d1e --refresh
//! wschat export 3f2a9c0d1e --out ./exports --format json
//! wschat --locale en refresh --progress json
//! ```

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use workspace_chats::config::{self, Config};
use workspace_chats::i18n::{self, MessageKey, Translator};
use workspace_chats::prefs::{self, PreferenceStore};
use workspace_chats::progress::ProgressMode;
use workspace_chats::{cache, chats, export, refresh, scanner};

/// Workspace Chats — browse, cache, and export VS Code workspace chat history.
#[derive(Parser)]
#[command(
    name = "wschat",
    about = "Browse, cache, and export the chat history stored in VS Code workspace storage",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When the file does not exist, built-in defaults are used and
    /// workspace commands report that storage is not configured.
    #[arg(long, global = true, default_value = "./config/wschat.toml")]
    config: PathBuf,

    /// Display locale for this run (e.g. `zh`, `en`), overriding the saved preference.
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Logs go to stderr.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List workspaces found under the storage root.
    Workspaces {
        /// Print the list as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the chat history of a workspace.
    ///
    /// Served from the cache while it is fresh (`[cache].max_age_secs`).
    Chats {
        /// Workspace name as printed by `wschat workspaces`.
        workspace: Option<String>,

        /// Ignore the cache and read the workspace database.
        #[arg(long)]
        refresh: bool,

        /// Print chats as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export the chat history of a workspace to a file.
    Export {
        /// Workspace name.
        workspace: String,

        /// Output directory. Defaults to `[export].dir`, otherwise prompts.
        #[arg(long)]
        out: Option<PathBuf>,

        /// `markdown` or `json`. Defaults to `[export].format`.
        #[arg(long)]
        format: Option<String>,
    },

    /// Re-read every workspace database into the cache.
    Refresh {
        /// Progress on stderr: `off`, `human`, or `json`. Default: human on a TTY.
        #[arg(long)]
        progress: Option<String>,
    },

    /// Inspect or clear the chat cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage the saved display locale.
    Locale {
        #[command(subcommand)]
        action: LocaleAction,
    },

    /// Inspect the localization table.
    I18n {
        #[command(subcommand)]
        action: I18nAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached workspaces.
    List,
    /// Remove one workspace from the cache.
    Evict {
        /// Workspace name.
        workspace: String,
    },
    /// Remove every cache entry.
    Reset,
}

#[derive(Subcommand)]
enum LocaleAction {
    /// Show the saved, active, and fallback locales.
    Show,
    /// Save the preferred locale.
    Set {
        /// `zh` or `en`.
        locale: String,
    },
    /// Forget the saved locale (falls back to the default).
    Unset,
}

#[derive(Subcommand)]
enum I18nAction {
    /// Resolve a dotted key path, e.g. `dialog.exportFail`.
    Get {
        key: String,
        /// Placeholder values as `name=value` pairs.
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Check that every locale defines every key.
    Check,
}

/// Parse a `key=value` pair for `--param` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Print a localized failure message and exit non-zero.
fn fail(translator: &Translator, key: MessageKey, error: &anyhow::Error) -> ! {
    let error = format!("{:#}", error);
    eprintln!("{}", translator.t_with(key, &[("error", &error)]));
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::debug!("no config at {}, using defaults", cli.config.display());
        Config::minimal()
    };

    let mut store = PreferenceStore::open(&cfg.preferences.path);
    let translator = match &cli.locale {
        Some(tag) => Translator::new(tag),
        None => Translator::from_preferences(&store),
    };
    tracing::debug!("active locale: {}", translator.active_locale());

    match cli.command {
        Commands::Workspaces { json } => {
            let result = cfg
                .storage()
                .and_then(|storage| scanner::run_list(storage, &translator, json));
            if let Err(e) = result {
                fail(&translator, MessageKey::DialogGetWorkspaceListFail, &e);
            }
        }
        Commands::Chats {
            workspace,
            refresh,
            json,
        } => {
            chats::run_chats(&cfg, &translator, workspace.as_deref(), refresh, json).await?;
        }
        Commands::Export {
            workspace,
            out,
            format,
        } => {
            if let Err(e) =
                export::run_export(&cfg, &translator, &workspace, out, format.as_deref()).await
            {
                fail(&translator, MessageKey::DialogExportFail, &e);
            }
        }
        Commands::Refresh { progress } => {
            let mode = match progress.as_deref() {
                Some(value) => ProgressMode::parse(value).ok_or_else(|| {
                    anyhow::anyhow!("Unknown progress mode: '{}'. Use off, human, or json.", value)
                })?,
                None => ProgressMode::default_for_tty(),
            };
            let reporter = mode.reporter(&translator);
            if mode == ProgressMode::Human {
                eprintln!("{}", translator.t(MessageKey::WorkspaceRefresh));
            }
            if let Err(e) = refresh::run_refresh(&cfg, &translator, reporter.as_ref()).await {
                fail(&translator, MessageKey::DialogRefreshFail, &e);
            }
        }
        Commands::Cache { action } => match action {
            CacheAction::List => cache::run_list(&cfg.cache.path)?,
            CacheAction::Evict { workspace } => cache::run_evict(&cfg.cache.path, &workspace)?,
            CacheAction::Reset => cache::run_reset(&cfg.cache.path)?,
        },
        Commands::Locale { action } => match action {
            LocaleAction::Show => prefs::run_locale_show(&store, &translator)?,
            LocaleAction::Set { locale } => prefs::run_locale_set(&mut store, &locale)?,
            LocaleAction::Unset => prefs::run_locale_unset(&mut store)?,
        },
        Commands::I18n { action } => match action {
            I18nAction::Get { key, params } => i18n::run_get(&translator, &key, &params)?,
            I18nAction::Check => i18n::run_check(&translator)?,
        },
    }

    Ok(())
}
