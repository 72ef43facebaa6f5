//! Reading records, field descriptors and saved views from disk.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;
use tabview_engine::{Schema, ViewConfig};

/// On-disk document format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Json,
    JsonLines,
    Yaml,
}

impl DocFormat {
    /// `.yaml`/`.yml` and `.jsonl`/`.ndjson` are recognized; anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => DocFormat::Yaml,
            Some("jsonl" | "ndjson") => DocFormat::JsonLines,
            _ => DocFormat::Json,
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read records from stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn parse_document<T: DeserializeOwned>(text: &str, format: DocFormat, path: &Path) -> Result<T> {
    match format {
        DocFormat::Yaml => serde_yaml::from_str(text)
            .with_context(|| format!("invalid YAML in {}", path.display())),
        DocFormat::Json | DocFormat::JsonLines => serde_json::from_str(text)
            .with_context(|| format!("invalid JSON in {}", path.display())),
    }
}

/// Loads the record list.
///
/// Accepts a top-level array, or an object holding the array under
/// `records`. JSON Lines files hold one record per non-blank line.
pub fn load_records(path: &Path) -> Result<Vec<Json>> {
    let text = read_source(path)?;
    let format = DocFormat::from_path(path);
    let records = match format {
        DocFormat::JsonLines => parse_lines(&text, path)?,
        _ => match parse_document::<Json>(&text, format, path)? {
            Json::Array(items) => items,
            Json::Object(mut map) => match map.remove("records") {
                Some(Json::Array(items)) => items,
                _ => bail!(
                    "{}: expected an array of records or an object with a `records` array",
                    path.display()
                ),
            },
            _ => bail!("{}: expected an array of records", path.display()),
        },
    };
    tracing::debug!(count = records.len(), path = %path.display(), "loaded records");
    Ok(records)
}

fn parse_lines(text: &str, path: &Path) -> Result<Vec<Json>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid JSON", path.display(), n + 1))
        })
        .collect()
}

/// Loads field descriptors: a list of `{id, dataDomain, label?}`.
pub fn load_fields(path: &Path) -> Result<Schema> {
    let text = read_source(path)?;
    let schema: Schema = parse_document(&text, DocFormat::from_path(path), path)?;
    if schema.is_empty() {
        bail!("{}: no fields defined", path.display());
    }
    Ok(schema)
}

pub fn load_view(path: &Path) -> Result<ViewConfig> {
    let text = read_source(path)?;
    parse_document(&text, DocFormat::from_path(path), path)
}

/// Writes a view configuration, as YAML or JSON by extension.
pub fn save_view(path: &Path, config: &ViewConfig) -> Result<()> {
    let text = render_document(config, DocFormat::from_path(path))?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "saved view");
    Ok(())
}

fn render_document<T: Serialize>(value: &T, format: DocFormat) -> Result<String> {
    Ok(match format {
        DocFormat::Yaml => serde_yaml::to_string(value)?,
        DocFormat::Json | DocFormat::JsonLines => {
            let mut text = serde_json::to_string_pretty(value)?;
            text.push('\n');
            text
        }
    })
}

/// The view id for a saved-view file: its file stem.
pub fn view_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("view")
        .to_string()
}
