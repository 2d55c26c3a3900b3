// src/ingest/mod.rs
//! One ingest pass: pull documents for each configured source from a feed,
//! then classify the whole batch on the worker pool.

pub mod feed;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::classify::{Classifier, ClassifyOutcome};
use crate::model::{Document, Source};
use feed::DocumentFeed;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_documents_total", "Documents returned by feeds.");
        describe_counter!("ingest_feed_errors_total", "Feed fetch/read errors.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when ingest last ran.");
    });
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub outcome: ClassifyOutcome,
    /// Documents fetched across all sources.
    pub documents: usize,
    /// Sources whose fetch failed (name, error).
    pub feed_errors: Vec<(String, String)>,
}

/// Fetch all `sources` through `feed` and classify the result.
///
/// A failing source is logged and skipped; it never aborts the run.
/// Cancellation is honored between sources and between documents.
pub async fn run_once(
    feed: &dyn DocumentFeed,
    sources: &[Arc<Source>],
    classifier: &Classifier,
    cancel: &CancellationToken,
) -> IngestReport {
    ensure_metrics_described();

    let mut docs: Vec<Arc<Document>> = Vec::new();
    let mut feed_errors = Vec::new();
    let mut fetch_cancelled = false;

    for src in sources {
        if cancel.is_cancelled() {
            fetch_cancelled = true;
            break;
        }
        match feed.fetch(src).await {
            Ok(v) => {
                tracing::debug!(target: "ingest", source = %src.name, docs = v.len(), "fetched");
                docs.extend(v.into_iter().map(Arc::new));
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, source = %src.name, feed = feed.name(), "feed error");
                counter!("ingest_feed_errors_total").increment(1);
                feed_errors.push((src.name.clone(), format!("{e:#}")));
            }
        }
    }

    let documents = docs.len();
    counter!("ingest_documents_total").increment(documents as u64);

    let mut outcome = classifier.classify_concurrent(docs, cancel).await;
    outcome.cancelled |= fetch_cancelled;

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    gauge!("ingest_last_run_ts").set(now as f64);

    tracing::info!(
        target: "ingest",
        sources = sources.len(),
        documents,
        insights = outcome.insights.len(),
        errors = feed_errors.len(),
        failed = outcome.failed,
        cancelled = outcome.cancelled,
        "ingest run finished"
    );

    IngestReport {
        outcome,
        documents,
        feed_errors,
    }
}
