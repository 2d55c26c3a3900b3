// src/classify/extractor.rs
//! Insight extractor: merges nearby matches of one category into a single
//! insight and cuts a sentence-aligned excerpt plus a wider context around it.
//!
//! Merging rule: two matches of the same category belong to one insight when
//! they sit in the same sentence, or when the gap between them is at most
//! [`PROXIMITY_WINDOW`] bytes. Excerpts extend to the nearest sentence
//! boundaries if those lie within [`SENTENCE_REACH`] bytes, otherwise a fixed
//! [`FALLBACK_WINDOW`] is used on that side.

use chrono::{DateTime, Utc};
use std::ops::Range;
use std::sync::Arc;

use super::scanner::Match;
use crate::model::{Document, Insight};
use crate::text::{ceil_char_boundary, floor_char_boundary, sentence_at, sentence_spans, trim_range};

/// Max gap (bytes) between matches that still merge across sentences.
pub const PROXIMITY_WINDOW: usize = 80;
/// How far (bytes) an excerpt may stretch to reach a sentence boundary.
pub const SENTENCE_REACH: usize = 240;
/// Fixed window (bytes) used when no sentence boundary is within reach.
pub const FALLBACK_WINDOW: usize = 80;

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub proximity_window: usize,
    pub sentence_reach: usize,
    pub fallback_window: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            proximity_window: PROXIMITY_WINDOW,
            sentence_reach: SENTENCE_REACH,
            fallback_window: FALLBACK_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    opts: ExtractOptions,
    clock: fn() -> DateTime<Utc>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

struct Cluster<'m> {
    start: usize,
    end: usize,
    members: Vec<&'m Match>,
}

impl Extractor {
    pub fn new(opts: ExtractOptions) -> Self {
        Self {
            opts,
            clock: Utc::now,
        }
    }

    /// Replace the source of `detected_at` (tests use a fixed instant).
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Swap the window settings, keeping the clock.
    pub fn with_options(mut self, opts: ExtractOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn options(&self) -> ExtractOptions {
        self.opts
    }

    /// Turn raw matches for `doc` into insights ordered by first match offset.
    pub fn extract(&self, doc: &Arc<Document>, matches: &[Match]) -> Vec<Insight> {
        let text = doc.text();
        let valid: Vec<&Match> = matches
            .iter()
            .filter(|m| {
                let ok = m.start < m.end
                    && m.end <= text.len()
                    && text.is_char_boundary(m.start)
                    && text.is_char_boundary(m.end);
                if !ok {
                    tracing::warn!(
                        target: "classify",
                        category = %m.category,
                        start = m.start,
                        end = m.end,
                        "dropping match with offsets outside document"
                    );
                }
                ok
            })
            .collect();
        if valid.is_empty() {
            return Vec::new();
        }

        let spans = sentence_spans(text);
        let detected_at = (self.clock)();

        // Group by category, first-seen order.
        let mut groups: Vec<(&str, Vec<&Match>)> = Vec::new();
        for m in valid {
            match groups.iter_mut().find(|(c, _)| *c == m.category) {
                Some((_, v)) => v.push(m),
                None => groups.push((m.category.as_str(), vec![m])),
            }
        }

        let mut drafts: Vec<(usize, usize, Insight)> = Vec::new();
        for (gi, (category, mut members)) in groups.into_iter().enumerate() {
            members.sort_by_key(|m| (m.start, m.end));
            for cluster in self.cluster(&spans, members) {
                let first = cluster.start;
                if let Some(ins) = self.build(doc, &spans, category, cluster, detected_at) {
                    drafts.push((first, gi, ins));
                }
            }
        }

        drafts.sort_by_key(|(first, gi, _)| (*first, *gi));
        drafts.into_iter().map(|(_, _, ins)| ins).collect()
    }

    fn cluster<'m>(&self, spans: &[Range<usize>], members: Vec<&'m Match>) -> Vec<Cluster<'m>> {
        let mut out: Vec<Cluster<'m>> = Vec::new();
        for m in members {
            if let Some(cur) = out.last_mut() {
                let same_sentence = sentence_at(spans, m.start) == sentence_at(spans, cur.end - 1);
                let near = m.start <= cur.end + self.opts.proximity_window;
                if same_sentence || near {
                    cur.end = cur.end.max(m.end);
                    cur.members.push(m);
                    continue;
                }
            }
            out.push(Cluster {
                start: m.start,
                end: m.end,
                members: vec![m],
            });
        }
        out
    }

    fn build(
        &self,
        doc: &Arc<Document>,
        spans: &[Range<usize>],
        category: &str,
        cluster: Cluster<'_>,
        detected_at: DateTime<Utc>,
    ) -> Option<Insight> {
        let text = doc.text();

        let mut terms: Vec<String> = Vec::new();
        for m in &cluster.members {
            if !terms.contains(&m.phrase) {
                terms.push(m.phrase.clone());
            }
        }

        let ex = self.excerpt_range(text, spans, cluster.start, cluster.end);
        if ex.is_empty() {
            return None;
        }
        let ctx = self.context_range(text, spans, ex.clone());

        let excerpt = collapse_ws(&text[ex]);
        let context = collapse_ws(&text[ctx]);

        let insight = Insight::new(
            Arc::clone(doc),
            category,
            excerpt,
            context,
            detected_at,
            terms.clone(),
        );
        if insight.is_none() {
            tracing::warn!(
                target: "classify",
                category,
                terms = ?terms,
                "excerpt does not contain all terms; insight skipped"
            );
        }
        insight
    }

    fn excerpt_range(
        &self,
        text: &str,
        spans: &[Range<usize>],
        start: usize,
        end: usize,
    ) -> Range<usize> {
        let first = &spans[sentence_at(spans, start)];
        let last = &spans[sentence_at(spans, end - 1)];

        let lo = if start - first.start <= self.opts.sentence_reach {
            first.start
        } else {
            floor_char_boundary(text, start.saturating_sub(self.opts.fallback_window))
        };
        let hi = if last.end - end <= self.opts.sentence_reach {
            last.end
        } else {
            ceil_char_boundary(text, end + self.opts.fallback_window)
        };
        trim_range(text, lo..hi)
    }

    /// Excerpt plus one neighbouring sentence on each side, within twice the reach.
    fn context_range(&self, text: &str, spans: &[Range<usize>], ex: Range<usize>) -> Range<usize> {
        let limit = 2 * self.opts.sentence_reach;
        let si = sentence_at(spans, ex.start);
        let ei = sentence_at(spans, ex.end - 1);

        let mut lo = if si > 0 { spans[si - 1].start } else { spans[si].start };
        if ex.start - lo.min(ex.start) > limit {
            lo = floor_char_boundary(text, ex.start.saturating_sub(2 * self.opts.fallback_window));
        }
        let mut hi = if ei + 1 < spans.len() {
            spans[ei + 1].end
        } else {
            spans[ei].end
        };
        if hi.max(ex.end) - ex.end > limit {
            hi = ceil_char_boundary(text, ex.end + 2 * self.opts.fallback_window);
        }
        trim_range(text, lo.min(ex.start)..hi.max(ex.end))
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
