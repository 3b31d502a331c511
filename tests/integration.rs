use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::SqlitePool;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn wschat_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("wschat");
    path
}

async fn create_state_db(path: &Path, sessions: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);
    let pool = SqlitePool::connect_with(options).await.unwrap();
    sqlx::query("CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO ItemTable (key, value) VALUES ('interactive.sessions', ?)")
        .bind(sessions)
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;
}

async fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let storage = root.join("workspaceStorage");
    create_state_db(
        &storage.join("alpha").join("state.vscdb"),
        r#"[{"requests": [
            {"message": {"text": "How do lifetimes work?"}, "response": [{"value": "They bound borrows."}]},
            {"message": {"text": "Thanks"}, "response": [{"value": "Anytime."}]}
        ]}]"#,
    )
    .await;
    fs::create_dir_all(storage.join("beta")).unwrap();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_content = format!(
        r#"[storage]
root = "{root}/workspaceStorage"

[cache]
path = "{root}/data/cache.json"

[preferences]
path = "{root}/data/preferences.json"

[export]
format = "markdown"
"#,
        root = root.display()
    );
    let config_path = config_dir.join("wschat.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_wschat(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = wschat_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run wschat binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[tokio::test]
async fn test_workspaces_default_locale_is_zh() {
    let (_tmp, config_path) = setup_test_env().await;

    let (stdout, stderr, success) = run_wschat(&config_path, &["workspaces"]);
    assert!(success, "workspaces failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("查找工作区"));
    assert!(stdout.contains("alpha"));
    assert!(stdout.contains("beta"));
}

#[tokio::test]
async fn test_workspaces_json() {
    let (_tmp, config_path) = setup_test_env().await;

    let (stdout, _, success) = run_wschat(&config_path, &["workspaces", "--json"]);
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed[0]["name"], "alpha");
    assert_eq!(parsed[0]["isDirectory"], true);
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_workspaces_missing_root_reports_failure() {
    let (tmp, config_path) = setup_test_env().await;
    fs::remove_dir_all(tmp.path().join("workspaceStorage")).unwrap();

    let (_, stderr, success) = run_wschat(&config_path, &["--locale", "en", "workspaces"]);
    assert!(!success);
    assert!(
        stderr.contains("Get workspace list failed: "),
        "stderr={}",
        stderr
    );
}

#[tokio::test]
async fn test_saved_locale_is_used() {
    let (_tmp, config_path) = setup_test_env().await;

    let (_, _, success) = run_wschat(&config_path, &["locale", "set", "en"]);
    assert!(success);

    let (stdout, _, success) = run_wschat(&config_path, &["workspaces"]);
    assert!(success);
    assert!(stdout.contains("Find Workspaces"));

    let (_, _, success) = run_wschat(&config_path, &["locale", "unset"]);
    assert!(success);
    let (stdout, _, _) = run_wschat(&config_path, &["workspaces"]);
    assert!(stdout.contains("查找工作区"));
}

#[tokio::test]
async fn test_unrecognized_saved_locale_falls_back_to_en() {
    let (tmp, config_path) = setup_test_env().await;
    let data = tmp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(
        data.join("preferences.json"),
        r#"{"preferred-locale": "fr"}"#,
    )
    .unwrap();

    let (stdout, stderr, success) = run_wschat(&config_path, &["workspaces"]);
    assert!(success, "stderr={}", stderr);
    assert!(stdout.contains("Find Workspaces"));
}

#[tokio::test]
async fn test_chats_lists_exchanges() {
    let (_tmp, config_path) = setup_test_env().await;

    let (stdout, stderr, success) =
        run_wschat(&config_path, &["--locale", "en", "chats", "alpha"]);
    assert!(success, "chats failed: stderr={}", stderr);
    assert!(stdout.contains("--- Dialog 1 ---"));
    assert!(stdout.contains("How do lifetimes work?"));
    assert!(stdout.contains("They bound borrows."));
    assert!(stdout.contains("--- Dialog 2 ---"));
}

#[tokio::test]
async fn test_chats_without_workspace_or_history() {
    let (_tmp, config_path) = setup_test_env().await;

    let (stdout, _, success) = run_wschat(&config_path, &["--locale", "en", "chats"]);
    assert!(success);
    assert!(stdout.contains("Select a workspace to view chat records"));

    // beta has no database at all
    let (_, _, success) = run_wschat(&config_path, &["--locale", "en", "chats", "beta"]);
    assert!(!success);
}

#[tokio::test]
async fn test_export_writes_markdown() {
    let (tmp, config_path) = setup_test_env().await;
    let out = tmp.path().join("exports");

    let (stdout, stderr, success) = run_wschat(
        &config_path,
        &["--locale", "en", "export", "alpha", "--out", out.to_str().unwrap()],
    );
    assert!(success, "export failed: stderr={}", stderr);
    assert!(stdout.contains("Export Success"));

    let files: Vec<_> = fs::read_dir(&out).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("alpha-") && name.ends_with(".md"), "{}", name);

    let content = fs::read_to_string(&files[0]).unwrap();
    assert!(content.contains("# alpha"));
    assert!(content.contains("### Question"));
    assert!(content.contains("They bound borrows."));
}

#[tokio::test]
async fn test_export_failure_is_localized() {
    let (tmp, config_path) = setup_test_env().await;
    let out = tmp.path().join("exports");

    let (_, stderr, success) = run_wschat(
        &config_path,
        &["export", "missing", "--out", out.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("导出失败："), "stderr={}", stderr);
}

#[tokio::test]
async fn test_export_without_directory_cancels_on_blank_answer() {
    let (tmp, config_path) = setup_test_env().await;

    // No --out and no [export].dir: the prompt reads an empty stdin.
    let (stdout, stderr, success) = run_wschat(&config_path, &["export", "alpha"]);
    assert!(success, "export failed: stderr={}", stderr);
    assert!(stdout.contains("取消"), "stdout={}", stdout);
    assert!(!stdout.contains("导出成功"));

    let written: Vec<_> = fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "md" || ext == "json"))
        .collect();
    assert!(written.is_empty(), "{:?}", written);
    assert!(!tmp.path().join("data").join("cache.json").exists());
}

#[tokio::test]
async fn test_refresh_populates_cache() {
    let (tmp, config_path) = setup_test_env().await;

    let (stdout, stderr, success) = run_wschat(
        &config_path,
        &["--locale", "en", "refresh", "--progress", "off"],
    );
    assert!(success, "refresh failed: stderr={}", stderr);
    assert!(stdout.contains("Refresh Success"));
    assert!(stdout.contains("updated: 1"));
    assert!(stdout.contains("skipped: 1"));

    let cache = fs::read_to_string(tmp.path().join("data").join("cache.json")).unwrap();
    let cache: serde_json::Value = serde_json::from_str(&cache).unwrap();
    assert_eq!(cache["alpha"]["chats"].as_array().unwrap().len(), 2);
    assert!(cache["alpha"]["lastUpdated"].as_i64().unwrap() > 0);

    let (stdout, _, success) = run_wschat(&config_path, &["cache", "list"]);
    assert!(success);
    assert!(stdout.contains("alpha"));

    let (_, _, success) = run_wschat(&config_path, &["cache", "reset"]);
    assert!(success);
    let (stdout, _, _) = run_wschat(&config_path, &["cache", "list"]);
    assert!(stdout.contains("Cache is empty."));
}

#[tokio::test]
async fn test_refresh_json_progress() {
    let (_tmp, config_path) = setup_test_env().await;

    let (_, stderr, success) = run_wschat(&config_path, &["refresh", "--progress", "json"]);
    assert!(success);
    let events: Vec<serde_json::Value> = stderr
        .lines()
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect();
    assert_eq!(events[0]["phase"], "discovering");
    assert!(events.iter().any(|e| e["workspace"] == "alpha"));
}

#[tokio::test]
async fn test_i18n_get_and_check() {
    let (_tmp, config_path) = setup_test_env().await;

    let (stdout, _, success) = run_wschat(
        &config_path,
        &[
            "--locale",
            "en",
            "i18n",
            "get",
            "dialog.exportFail",
            "--param",
            "error=disk full",
        ],
    );
    assert!(success);
    assert_eq!(stdout.trim(), "Export Failed: disk full");

    let (stdout, _, success) = run_wschat(&config_path, &["i18n", "get", "no.such.key"]);
    assert!(success);
    assert_eq!(stdout.trim(), "no.such.key");

    let (stdout, stderr, success) = run_wschat(&config_path, &["i18n", "check"]);
    assert!(success, "check failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("0 missing"));
}
