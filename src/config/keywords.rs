// src/config/keywords.rs
//! Keyword categories as an explicit configuration object.
//!
//! TOML shape:
//! ```toml
//! [[categories]]
//! name = "rfp"
//! phrases = ["request for proposal", "rfp"]
//! ```
//! JSON: the same object, or a bare list of `{name, phrases}`.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{ext_of, DEFAULT_KEYWORDS_PATHS, ENV_KEYWORDS_PATH};
use crate::classify::{ConfigError, KeywordIndex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCfg {
    pub name: String,
    #[serde(default)]
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeywordConfig {
    #[serde(default)]
    pub categories: Vec<CategoryCfg>,
}

const BUILTIN: &[(&str, &[&str])] = &[
    (
        "rfp",
        &["request for proposal", "rfp", "solicitation", "manager search"],
    ),
    (
        "allocation",
        &["allocation", "commitment", "commitments", "pacing", "plan"],
    ),
    (
        "strategy",
        &[
            "strategy",
            "focus",
            "priority",
            "emerging markets",
            "core",
            "value-add",
            "opportunistic",
        ],
    ),
    (
        "performance",
        &[
            "performance",
            "benchmark",
            "returns",
            "irr",
            "distribution",
            "valuation",
        ],
    ),
];

impl KeywordConfig {
    /// Stock categories for institutional LP documents.
    pub fn builtin() -> Self {
        Self {
            categories: BUILTIN
                .iter()
                .map(|(name, phrases)| CategoryCfg {
                    name: (*name).to_string(),
                    phrases: phrases.iter().map(|p| (*p).to_string()).collect(),
                })
                .collect(),
        }
    }

    /// Compile into a keyword index (category order preserved).
    pub fn to_index(&self) -> Result<KeywordIndex, ConfigError> {
        KeywordIndex::build(
            self.categories
                .iter()
                .map(|c| (c.name.as_str(), c.phrases.iter())),
        )
    }
}

/// Load keyword config from an explicit path (TOML or JSON).
pub fn load_keywords_from(path: &Path) -> Result<KeywordConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading keywords from {}", path.display()))?;
    let cfg = parse_keywords(&content, ext_of(path).as_str())
        .with_context(|| format!("parsing keywords from {}", path.display()))?;
    tracing::info!(
        target: "config",
        path = %path.display(),
        categories = cfg.categories.len(),
        "keywords loaded"
    );
    Ok(cfg)
}

/// Load keywords using env var + fallbacks:
/// 1) $LP_KEYWORDS_PATH
/// 2) config/keywords.toml, config/keywords.json
/// 3) built-in defaults
pub fn load_keywords_default() -> Result<KeywordConfig> {
    if let Ok(p) = std::env::var(ENV_KEYWORDS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_keywords_from(&pb);
        } else {
            return Err(anyhow!("{ENV_KEYWORDS_PATH} points to non-existent path"));
        }
    }
    for candidate in DEFAULT_KEYWORDS_PATHS {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return load_keywords_from(&pb);
        }
    }
    tracing::debug!(target: "config", "no keyword file found; using built-in categories");
    Ok(KeywordConfig::builtin())
}

fn parse_keywords(s: &str, hint_ext: &str) -> Result<KeywordConfig> {
    let try_toml = hint_ext == "toml" || (hint_ext != "json" && s.contains("[[categories]]"));
    if try_toml {
        if let Ok(v) = toml::from_str::<KeywordConfig>(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_json::from_str::<KeywordConfig>(s) {
        return Ok(v);
    }
    if let Ok(v) = serde_json::from_str::<Vec<CategoryCfg>>(s) {
        return Ok(KeywordConfig { categories: v });
    }
    if !try_toml {
        if let Ok(v) = toml::from_str::<KeywordConfig>(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported keywords format"))
}
