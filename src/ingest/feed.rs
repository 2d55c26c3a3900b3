// src/ingest/feed.rs
//! Document feeds: the seam where fetched, text-extracted documents enter the
//! classifier. Network retrieval and PDF conversion live outside this crate;
//! the feeds here cover local text/HTML files and in-memory fixtures.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::{DocType, Document, Source};

#[async_trait]
pub trait DocumentFeed: Send + Sync {
    /// Fetch every document currently available for `source`.
    async fn fetch(&self, source: &Arc<Source>) -> Result<Vec<Document>>;
    fn name(&self) -> &'static str;
}

/// Reads plain-text or HTML files from local paths (`/x/y`, `./x`, `file:///x`).
/// A directory source yields one document per supported file, in name order.
#[derive(Debug, Clone, Default)]
pub struct LocalTextFeed {
    root: Option<PathBuf>,
}

const SUPPORTED_EXTS: [&str; 5] = ["txt", "text", "md", "html", "htm"];

impl LocalTextFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative source paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> Result<PathBuf> {
        let lowered = url.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            bail!("remote url `{url}` needs an external fetcher");
        }
        let raw = url.strip_prefix("file://").unwrap_or(url);
        let p = PathBuf::from(raw);
        Ok(match &self.root {
            Some(root) if p.is_relative() => root.join(p),
            _ => p,
        })
    }
}

fn content_type_for(path: &Path, doc_type: DocType) -> &'static str {
    match crate::config::ext_of(path).as_str() {
        "html" | "htm" => "text/html",
        "md" => "text/markdown",
        "txt" | "text" => "text/plain",
        _ if doc_type == DocType::Html => "text/html",
        _ => "text/plain",
    }
}

async fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut rd = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("listing {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = rd.next_entry().await? {
        let p = entry.path();
        let ext = crate::config::ext_of(&p);
        if p.is_file() && SUPPORTED_EXTS.contains(&ext.as_str()) {
            files.push(p);
        }
    }
    files.sort();
    Ok(files)
}

#[async_trait]
impl DocumentFeed for LocalTextFeed {
    async fn fetch(&self, source: &Arc<Source>) -> Result<Vec<Document>> {
        if source.doc_type == DocType::Pdf {
            bail!(
                "source `{}` is a PDF; text extraction must happen upstream",
                source.name
            );
        }
        let path = self.resolve(&source.url)?;
        let meta = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("source `{}`: {}", source.name, path.display()))?;

        let files = if meta.is_dir() {
            list_dir(&path).await?
        } else {
            if crate::config::ext_of(&path) == "pdf" {
                bail!("source `{}` points at a PDF file", source.name);
            }
            vec![path]
        };

        let mut docs = Vec::with_capacity(files.len());
        for f in files {
            let raw = tokio::fs::read_to_string(&f)
                .await
                .with_context(|| format!("reading {}", f.display()))?;
            docs.push(Document::normalized(
                Arc::clone(source),
                Utc::now(),
                f.display().to_string(),
                content_type_for(&f, source.doc_type),
                &raw,
            ));
        }
        Ok(docs)
    }

    fn name(&self) -> &'static str {
        "LocalTextFeed"
    }
}

/// In-memory feed keyed by source name (tests, demos).
#[derive(Debug, Clone, Default)]
pub struct FixtureFeed {
    texts: HashMap<String, Vec<(String, String)>>,
}

impl FixtureFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(
        mut self,
        source: impl Into<String>,
        location: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.texts
            .entry(source.into())
            .or_default()
            .push((location.into(), text.into()));
        self
    }
}

#[async_trait]
impl DocumentFeed for FixtureFeed {
    async fn fetch(&self, source: &Arc<Source>) -> Result<Vec<Document>> {
        let Some(items) = self.texts.get(&source.name) else {
            return Ok(Vec::new());
        };
        Ok(items
            .iter()
            .map(|(loc, text)| {
                Document::new(Arc::clone(source), Utc::now(), loc, "text/plain", text.as_str())
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "FixtureFeed"
    }
}
