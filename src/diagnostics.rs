// src/diagnostics.rs
//! Dev-only, anonymized diagnostics for classification runs.
//! Raw document text is never logged, only a short hash of it.

use tracing::info;

use crate::config::{ENV_DEV_LOG, ENV_RUNTIME_ENV};

// Dev logging gate: LP_DEV_LOG=1 AND dev env (debug build, `debug` feature,
// or LP_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) || cfg!(feature = "debug") {
        return true;
    }
    matches!(
        std::env::var(ENV_RUNTIME_ENV)
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Short, stable id for a text body: first 6 bytes of its SHA-256, hex.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Per-document classification event (dev-gated).
pub(crate) fn dev_log_document(
    event: &str,
    text: &str,
    source: &str,
    matches: usize,
    insights: usize,
) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(text);
    info!(
        target: "classify",
        %id, source, matches, insights, bytes = text.len(), event
    );
}
