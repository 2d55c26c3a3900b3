// src/classify/mod.rs
//! Classification pipeline: scanner + extractor over a batch of documents.
//!
//! Each document is classified independently from `(text, index)`, so the
//! concurrent path just fans documents out to blocking workers and restores
//! input order afterwards.

pub mod error;
pub mod extractor;
pub mod index;
pub mod scanner;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::model::{Document, Insight};

pub use error::{ConfigError, LookupError};
pub use extractor::{ExtractOptions, Extractor, FALLBACK_WINDOW, PROXIMITY_WINDOW, SENTENCE_REACH};
pub use index::KeywordIndex;
pub use scanner::{scan, Match, ScanOptions, Scanner};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("classify_documents_total", "Documents scanned by the classifier.");
        describe_counter!("classify_insights_total", "Insights emitted by the classifier.");
        describe_counter!(
            "classify_cancelled_total",
            "Concurrent runs abandoned via cancellation."
        );
        describe_counter!("classify_failed_total", "Documents lost to a failed worker.");
        describe_histogram!("classify_document_ms", "Scan + extract time per document in ms.");
    });
}

/// Result of a concurrent run. `insights` always follow document input order.
#[derive(Debug, Default)]
pub struct ClassifyOutcome {
    pub insights: Vec<Insight>,
    /// Documents that were fully classified.
    pub processed: usize,
    /// Documents whose worker panicked; they contribute no insights.
    pub failed: usize,
    pub total: usize,
    pub cancelled: bool,
}

/// Scanner + extractor bound to a shared keyword index.
#[derive(Debug, Clone)]
pub struct Classifier {
    index: Arc<KeywordIndex>,
    scanner: Scanner,
    extractor: Extractor,
    workers: usize,
}

/// Classify `documents` sequentially in input order.
pub fn classify(
    documents: &[Arc<Document>],
    index: Arc<KeywordIndex>,
) -> Result<Vec<Insight>, ConfigError> {
    Ok(Classifier::new(index)?.classify(documents))
}

impl Classifier {
    pub fn new(index: Arc<KeywordIndex>) -> Result<Self, ConfigError> {
        if index.is_empty() {
            return Err(ConfigError::EmptyIndex);
        }
        ensure_metrics_described();
        Ok(Self {
            index,
            scanner: Scanner::default(),
            extractor: Extractor::default(),
            workers: 0,
        })
    }

    pub fn with_scan_options(mut self, opts: ScanOptions) -> Self {
        self.scanner = Scanner::new(opts);
        self
    }

    pub fn with_extract_options(mut self, opts: ExtractOptions) -> Self {
        self.extractor = self.extractor.with_options(opts);
        self
    }

    /// Replace the whole extractor (options and clock).
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Worker count for `classify_concurrent`; `0` = available parallelism.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn index(&self) -> &Arc<KeywordIndex> {
        &self.index
    }

    fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Scan + extract a single document. Pure apart from the extractor clock.
    pub fn classify_document(&self, doc: &Arc<Document>) -> Vec<Insight> {
        let t0 = Instant::now();
        let matches = self.scanner.scan(doc.text(), &self.index);
        let insights = if matches.is_empty() {
            Vec::new()
        } else {
            self.extractor.extract(doc, &matches)
        };

        counter!("classify_documents_total").increment(1);
        counter!("classify_insights_total").increment(insights.len() as u64);
        histogram!("classify_document_ms").record(t0.elapsed().as_secs_f64() * 1000.0);

        crate::diagnostics::dev_log_document(
            "classified",
            doc.text(),
            doc.source().name.as_str(),
            matches.len(),
            insights.len(),
        );
        insights
    }

    /// Sequential batch: documents in input order, each keeping its own order.
    pub fn classify(&self, documents: &[Arc<Document>]) -> Vec<Insight> {
        documents
            .iter()
            .flat_map(|d| self.classify_document(d))
            .collect()
    }

    /// Worker-pool batch. `cancel` is checked before each document is handed to
    /// a worker; documents already running are allowed to finish.
    pub async fn classify_concurrent(
        &self,
        documents: Vec<Arc<Document>>,
        cancel: &CancellationToken,
    ) -> ClassifyOutcome {
        let total = documents.len();
        let workers = self.effective_workers();
        let permits = Arc::new(Semaphore::new(workers));
        let mut set: JoinSet<(usize, Vec<Insight>)> = JoinSet::new();
        let mut cancelled = false;

        for (idx, doc) in documents.into_iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                p = Arc::clone(&permits).acquire_owned() => match p {
                    Ok(p) => p,
                    Err(_) => break,
                },
            };
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let this = self.clone();
            set.spawn_blocking(move || {
                let _permit = permit;
                (idx, this.classify_document(&doc))
            });
        }

        let mut done: Vec<(usize, Vec<Insight>)> = Vec::with_capacity(total);
        let mut failed = 0usize;
        while let Some(res) = set.join_next().await {
            match res {
                Ok(pair) => done.push(pair),
                Err(e) => {
                    failed += 1;
                    counter!("classify_failed_total").increment(1);
                    tracing::error!(target: "classify", error = %e, "classification worker failed");
                }
            }
        }

        // Completion order is arbitrary; restore input order.
        done.sort_by_key(|(idx, _)| *idx);
        let processed = done.len();
        let insights: Vec<Insight> = done.into_iter().flat_map(|(_, v)| v).collect();

        if cancelled {
            counter!("classify_cancelled_total").increment(1);
            tracing::info!(
                target: "classify",
                processed,
                total,
                "classification cancelled; returning partial results"
            );
        }

        ClassifyOutcome {
            insights,
            processed,
            failed,
            total,
            cancelled,
        }
    }
}
