// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod ingest;
pub mod model;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::classify::{
    classify, scan, Classifier, ClassifyOutcome, ConfigError, ExtractOptions, Extractor,
    KeywordIndex, LookupError, Match, ScanOptions, Scanner,
};
pub use crate::config::{KeywordConfig, Settings};
pub use crate::ingest::feed::{DocumentFeed, FixtureFeed, LocalTextFeed};
pub use crate::ingest::{run_once, IngestReport};
pub use crate::model::{DocType, Document, Insight, Source};

// Cancellation signal accepted by the concurrent paths.
pub use tokio_util::sync::CancellationToken;
