//! Crawl snapshots: the pages handed from the crawler to the search engine.
//!
//! A snapshot is JSONL (one [`CrawledPage`] per line), a JSON file holding a
//! page or an array of pages, or a directory tree of such files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawledPage {
    #[serde(default)]
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub fetched_at: Option<String>,
}

impl CrawledPage {
    pub fn new(url: impl Into<String>, titles: Vec<String>, paragraphs: Vec<String>) -> Self {
        Self { id: String::new(), url: url.into(), titles, paragraphs, fetched_at: None }
    }
}

pub fn load_pages<P: AsRef<Path>>(path: P) -> Result<Vec<CrawledPage>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        anyhow::bail!("snapshot path {} does not exist", path.display());
    }

    let mut pages = Vec::new();
    for file in files {
        let loaded = if extension(&file) == Some("json") { read_json(&file) } else { read_jsonl(&file) };
        pages.extend(loaded.with_context(|| format!("reading snapshot {}", file.display()))?);
    }
    tracing::debug!(pages = pages.len(), path = %path.display(), "loaded crawl snapshot");
    Ok(pages)
}

/// Write pages as JSONL.
pub fn write_pages<'a, W: Write>(mut out: W, pages: impl IntoIterator<Item = &'a CrawledPage>) -> Result<()> {
    for page in pages {
        serde_json::to_writer(&mut out, page)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path) -> Result<Vec<CrawledPage>> {
    let reader = BufReader::new(File::open(file)?);
    let mut pages = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let page = serde_json::from_str(&line).with_context(|| format!("line {}", lineno + 1))?;
        pages.push(page);
    }
    Ok(pages)
}

fn read_json(file: &Path) -> Result<Vec<CrawledPage>> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(|v| serde_json::from_value::<CrawledPage>(v).map_err(anyhow::Error::from))
            .collect(),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(json)?]),
        _ => Ok(Vec::new()),
    }
}
