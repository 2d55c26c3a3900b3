// src/config/mod.rs
//! Configuration surface: env names, default paths, and loaders for sources
//! and keyword categories.

pub mod keywords;
pub mod sources;

pub use keywords::{load_keywords_default, load_keywords_from, CategoryCfg, KeywordConfig};
pub use sources::{load_sources_default, load_sources_from, resolve_sources_path};

// --- env names ---
pub const ENV_SOURCES_PATH: &str = "LP_SOURCES_PATH";
pub const ENV_KEYWORDS_PATH: &str = "LP_KEYWORDS_PATH";
pub const ENV_WORKERS: &str = "LP_WORKERS";
pub const ENV_DEV_LOG: &str = "LP_DEV_LOG";
pub const ENV_RUNTIME_ENV: &str = "LP_ENV";
pub const ENV_LOG_FORMAT: &str = "LP_LOG_FORMAT";

// --- default locations (relative to the working dir) ---
pub const DEFAULT_SOURCES_PATHS: [&str; 4] = [
    "config/sources.toml",
    "config/sources.json",
    "config/sources.yml",
    "config/sources.yaml",
];
pub const DEFAULT_KEYWORDS_PATHS: [&str; 2] = ["config/keywords.toml", "config/keywords.json"];

/// Runtime knobs read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    /// Classification workers; `0` = available parallelism.
    pub workers: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            workers: parse_workers_env(std::env::var(ENV_WORKERS).ok()),
        }
    }
}

// parse optional worker count; anything unparsable falls back to auto (0)
fn parse_workers_env(raw: Option<String>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .map(|v| v.min(1024))
        .unwrap_or(0)
}

/// Lowercased file extension, or "" when absent.
pub(crate) fn ext_of(path: &std::path::Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}
