//! Export a workspace's chats to a file.
//!
//! Markdown output uses the active locale for its headings; JSON output
//! carries the workspace name, export time, and the raw chats.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::chats;
use crate::config::Config;
use crate::i18n::{MessageKey, Translator};
use crate::models::Chat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            other => bail!(
                "Unknown export format: '{}'. Must be markdown or json.",
                other
            ),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportData<'a> {
    workspace: &'a str,
    exported_at: String,
    chats: &'a [Chat],
}

pub fn render_markdown(translator: &Translator, workspace: &str, chats: &[Chat]) -> String {
    let dialog = translator.t(MessageKey::ChatDialog);
    let question = translator.t(MessageKey::ChatQuestion);
    let answer = translator.t(MessageKey::ChatAnswer);

    let mut out = format!("# {}\n", workspace);
    for (i, chat) in chats.iter().enumerate() {
        out.push_str(&format!("\n## {} {}\n\n", dialog, i + 1));
        out.push_str(&format!("### {}\n\n{}\n\n", question, chat.question.trim_end()));
        out.push_str(&format!("### {}\n\n{}\n", answer, chat.answer.trim_end()));
    }
    out
}

pub fn render_json(workspace: &str, chats: &[Chat], exported_at: DateTime<Utc>) -> Result<String> {
    let data = ExportData {
        workspace,
        exported_at: exported_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        chats,
    };
    Ok(serde_json::to_string_pretty(&data)?)
}

/// Write the export into `dir` and return the created file's path.
pub fn export_chats(
    translator: &Translator,
    workspace: &str,
    chats: &[Chat],
    dir: &Path,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let content = match format {
        ExportFormat::Markdown => render_markdown(translator, workspace, chats),
        ExportFormat::Json => render_json(workspace, chats, now)?,
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

    let file_name = format!(
        "{}-{}.{}",
        workspace,
        now.format("%Y%m%d-%H%M%S"),
        format.extension()
    );
    let path = dir.join(file_name);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write export: {}", path.display()))?;

    tracing::info!("exported {} chats to {}", chats.len(), path.display());
    Ok(path)
}

/// Ask for a directory on stdin. `None` when the answer is blank.
fn prompt_export_dir(translator: &Translator) -> Result<Option<PathBuf>> {
    eprint!("{}: ", translator.t(MessageKey::DialogExportTitle));
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        Ok(None)
    } else {
        Ok(Some(PathBuf::from(line)))
    }
}

/// CLI entry point for `wschat export`.
pub async fn run_export(
    config: &Config,
    translator: &Translator,
    workspace: &str,
    out: Option<PathBuf>,
    format: Option<&str>,
) -> Result<()> {
    let format = ExportFormat::parse(format.unwrap_or(&config.export.format))?;

    let dir = match out.or_else(|| config.export.dir.clone()) {
        Some(dir) => dir,
        None => match prompt_export_dir(translator)? {
            Some(dir) => dir,
            None => {
                println!("{}", translator.t(MessageKey::DialogCancel));
                return Ok(());
            }
        },
    };

    let chats = chats::workspace_chats(config, workspace, false).await?;
    let path = export_chats(translator, workspace, &chats, &dir, format, Utc::now())?;

    println!("{}", translator.t(MessageKey::DialogExportSuccess));
    println!("  {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample() -> Vec<Chat> {
        vec![
            Chat {
                question: "How do I borrow?".to_string(),
                answer: "With &.\n".to_string(),
            },
            Chat {
                question: "And mutably?".to_string(),
                answer: "With &mut.".to_string(),
            },
        ]
    }

    #[test]
    fn markdown_headings_are_localized() {
        let en = render_markdown(&Translator::new("en"), "ws1", &sample());
        assert!(en.starts_with("# ws1\n"));
        assert!(en.contains("## Dialog 1\n"));
        assert!(en.contains("### Question\n\nHow do I borrow?\n"));
        assert!(en.contains("### Answer\n\nWith &mut.\n"));

        let zh = render_markdown(&Translator::new("zh"), "ws1", &sample());
        assert!(zh.contains("## 对话 2\n"));
        assert!(zh.contains("### 问题\n"));
        assert!(zh.contains("### 回答\n"));
    }

    #[test]
    fn json_export_shape() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let json = render_json("ws1", &sample(), at).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["workspace"], "ws1");
        assert_eq!(value["exportedAt"], "2024-05-01T12:30:00Z");
        assert_eq!(value["chats"][1]["answer"], "With &mut.");
    }

    #[test]
    fn export_writes_timestamped_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("out");
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();

        let path = export_chats(
            &Translator::new("en"),
            "ws1",
            &sample(),
            &dir,
            ExportFormat::Markdown,
            at,
        )
        .unwrap();

        assert_eq!(path, dir.join("ws1-20240501-123000.md"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("How do I borrow?"));
    }

    #[test]
    fn format_parsing() {
        assert_eq!(ExportFormat::parse("md").unwrap(), ExportFormat::Markdown);
        assert_eq!(ExportFormat::parse("json").unwrap().extension(), "json");
        assert!(ExportFormat::parse("pdf").is_err());
    }
}
