// src/config/sources.rs
//! Source list loading. Supports TOML (`[[sources]]`), JSON and YAML
//! (a top-level list, or an object with a `sources` list).
//!
//! `tags` may be given as a single string or a list; it is normalized here
//! into a trimmed, de-duplicated set. Disabled sources are dropped.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{ext_of, DEFAULT_SOURCES_PATHS, ENV_SOURCES_PATH};
use crate::model::{DocType, Source};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagsField {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: String,
    url: String,
    #[serde(default)]
    doc_type: DocType,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    tags: Option<TagsField>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceList {
    Wrapped { sources: Vec<RawSource> },
    Bare(Vec<RawSource>),
}

impl SourceList {
    fn into_vec(self) -> Vec<RawSource> {
        match self {
            SourceList::Wrapped { sources } => sources,
            SourceList::Bare(v) => v,
        }
    }
}

/// Load enabled sources from an explicit path.
pub fn load_sources_from(path: &Path) -> Result<Vec<Arc<Source>>> {
    if !path.exists() {
        bail!("Source file not found at {}", path.display());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let raw = parse_sources(&content, ext_of(path).as_str())
        .with_context(|| format!("parsing sources from {}", path.display()))?;
    let sources = into_sources(raw)?;
    tracing::info!(
        target: "config",
        path = %path.display(),
        enabled = sources.len(),
        "sources loaded"
    );
    Ok(sources)
}

/// Locate the sources file using env var + fallbacks:
/// 1) $LP_SOURCES_PATH
/// 2) config/sources.toml, .json, .yml, .yaml
pub fn resolve_sources_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(pb);
        } else {
            return Err(anyhow!("{ENV_SOURCES_PATH} points to non-existent path"));
        }
    }
    DEFAULT_SOURCES_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|pb| pb.exists())
        .ok_or_else(|| {
            anyhow!(
                "Source file not found (tried {})",
                DEFAULT_SOURCES_PATHS.join(", ")
            )
        })
}

/// Load sources from the location picked by [`resolve_sources_path`].
pub fn load_sources_default() -> Result<Vec<Arc<Source>>> {
    load_sources_from(&resolve_sources_path()?)
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<RawSource>> {
    match hint_ext {
        "toml" => return parse_toml(s),
        "json" => return parse_json(s),
        "yml" | "yaml" => return parse_yaml(s),
        _ => {}
    }
    // Unknown extension: sniff in order of strictness.
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if let Ok(v) = parse_toml(s) {
        return Ok(v);
    }
    parse_yaml(s).map_err(|_| anyhow!("unsupported sources format"))
}

fn parse_toml(s: &str) -> Result<Vec<RawSource>> {
    #[derive(Deserialize)]
    struct TomlSources {
        #[serde(default)]
        sources: Vec<RawSource>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(v.sources)
}

fn parse_json(s: &str) -> Result<Vec<RawSource>> {
    let v: SourceList = serde_json::from_str(s)?;
    Ok(v.into_vec())
}

fn parse_yaml(s: &str) -> Result<Vec<RawSource>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    let v: SourceList = serde_yaml::from_str(s)?;
    Ok(v.into_vec())
}

fn clean_tags(tags: Option<TagsField>) -> BTreeSet<String> {
    let items = match tags {
        None => Vec::new(),
        Some(TagsField::One(s)) => vec![s],
        Some(TagsField::Many(v)) => v,
    };
    items
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn into_sources(raw: Vec<RawSource>) -> Result<Vec<Arc<Source>>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    let mut disabled = 0usize;

    for item in raw {
        let name = item.name.trim().to_string();
        let url = item.url.trim().to_string();
        if name.is_empty() {
            bail!("source with url `{url}` has a blank name");
        }
        if url.is_empty() {
            bail!("source `{name}` has a blank url");
        }
        if !seen.insert(name.clone()) {
            bail!("duplicate source name `{name}`");
        }
        if !item.enabled {
            disabled += 1;
            continue;
        }
        out.push(Arc::new(Source {
            name,
            url,
            doc_type: item.doc_type,
            enabled: true,
            notes: item.notes.filter(|n| !n.trim().is_empty()),
            tags: clean_tags(item.tags),
        }));
    }

    if disabled > 0 {
        tracing::debug!(target: "config", disabled, "skipped disabled sources");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_sources_with_defaults_and_tags() {
        let toml = r#"
[[sources]]
name = "CalPERS"
url = "https://example.org/calpers/board.pdf"
doc_type = "pdf"
tags = "public pension"

[[sources]]
name = "Yale"
url = "https://example.org/yale.html"
tags = [" endowment ", "", "endowment", "ivy"]
notes = "quarterly letter"

[[sources]]
name = "Old Fund"
url = "https://example.org/old"
enabled = false
"#;
        let out = into_sources(parse_toml(toml).unwrap()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].doc_type, DocType::Pdf);
        assert_eq!(
            out[0].tags.iter().collect::<Vec<_>>(),
            vec!["public pension"]
        );
        assert_eq!(out[1].doc_type, DocType::Auto);
        assert_eq!(out[1].tags.iter().collect::<Vec<_>>(), vec!["endowment", "ivy"]);
        assert_eq!(out[1].notes.as_deref(), Some("quarterly letter"));
    }

    #[test]
    fn json_bare_and_wrapped_lists() {
        let bare = r#"[{"name":"A","url":"u1"},{"name":"B","url":"u2","enabled":false}]"#;
        let wrapped = r#"{"sources":[{"name":"A","url":"u1","doc_type":"html"}]}"#;
        assert_eq!(into_sources(parse_json(bare).unwrap()).unwrap().len(), 1);
        let w = into_sources(parse_json(wrapped).unwrap()).unwrap();
        assert_eq!(w[0].doc_type, DocType::Html);
    }

    #[test]
    fn yaml_list_parses() {
        let yaml = "- name: A\n  url: u1\n  tags: solo\n- name: B\n  url: u2\n  doc_type: text\n";
        let out = into_sources(parse_yaml(yaml).unwrap()).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[0].tags.contains("solo"));
        assert_eq!(out[1].doc_type, DocType::Text);
        assert!(parse_yaml("").unwrap().is_empty());
    }

    #[test]
    fn duplicate_and_blank_names_are_rejected() {
        let dup = r#"[{"name":"A","url":"u1"},{"name":" A ","url":"u2"}]"#;
        assert!(into_sources(parse_json(dup).unwrap()).is_err());
        let blank = r#"[{"name":"  ","url":"u1"}]"#;
        assert!(into_sources(parse_json(blank).unwrap()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_sources_from(Path::new("__no_such_sources__.toml")).unwrap_err();
        assert!(err.to_string().contains("Source file not found"));
    }
}
