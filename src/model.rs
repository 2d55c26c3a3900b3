// src/model.rs
//! Core records: configured sources, fetched documents, and the insights
//! produced by classification. All of them are immutable once built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::text::{normalize_text, FoldedText};

/// Declared document format of a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Pdf,
    Html,
    Text,
    #[default]
    Auto,
}

/// A configured origin of documents. Identity is the `name`.
#[derive(Debug, Clone, Serialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    pub doc_type: DocType,
    pub enabled: bool,
    pub notes: Option<String>,
    pub tags: BTreeSet<String>,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            doc_type: DocType::Auto,
            enabled: true,
            notes: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_doc_type(mut self, doc_type: DocType) -> Self {
        self.doc_type = doc_type;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Source {}

impl Hash for Source {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Fetched content plus metadata, ready for classification.
#[derive(Debug, Clone)]
pub struct Document {
    source: Arc<Source>,
    fetched_at: DateTime<Utc>,
    location: String,
    content_type: String,
    text: String,
}

impl Document {
    /// Build a document from already-clean text (stored as given).
    pub fn new(
        source: Arc<Source>,
        fetched_at: DateTime<Utc>,
        location: impl Into<String>,
        content_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            source,
            fetched_at,
            location: location.into(),
            content_type: content_type.into(),
            text: text.into(),
        }
    }

    /// Build a document from raw extracted text, running it through `normalize_text` first.
    pub fn normalized(
        source: Arc<Source>,
        fetched_at: DateTime<Utc>,
        location: impl Into<String>,
        content_type: impl Into<String>,
        raw_text: &str,
    ) -> Self {
        Self::new(
            source,
            fetched_at,
            location,
            content_type,
            normalize_text(raw_text),
        )
    }

    pub fn source(&self) -> &Arc<Source> {
        &self.source
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Compact view of a document used when serializing insights (never the full text).
#[derive(Serialize)]
struct DocRef<'a> {
    source: &'a str,
    location: &'a str,
    content_type: &'a str,
    fetched_at: DateTime<Utc>,
}

fn serialize_doc_ref<S: Serializer>(doc: &Arc<Document>, ser: S) -> Result<S::Ok, S::Error> {
    DocRef {
        source: &doc.source.name,
        location: &doc.location,
        content_type: &doc.content_type,
        fetched_at: doc.fetched_at,
    }
    .serialize(ser)
}

/// A synthesized finding: one or more nearby keyword hits of a single category.
///
/// `terms` is never empty, keeps first-seen order, and every term occurs
/// (case-insensitively) inside `excerpt`. [`Insight::new`] refuses anything
/// else, so every `Insight` in circulation upholds this.
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    #[serde(serialize_with = "serialize_doc_ref")]
    doc: Arc<Document>,
    category: String,
    excerpt: String,
    context: String,
    detected_at: DateTime<Utc>,
    terms: Vec<String>,
}

impl Insight {
    /// Returns `None` when `terms` is empty or a term is missing from `excerpt`.
    pub fn new(
        doc: Arc<Document>,
        category: impl Into<String>,
        excerpt: impl Into<String>,
        context: impl Into<String>,
        detected_at: DateTime<Utc>,
        terms: Vec<String>,
    ) -> Option<Self> {
        let excerpt = excerpt.into();
        let folded = FoldedText::new(&excerpt);
        let covered = terms
            .iter()
            .all(|t| folded.as_str().contains(FoldedText::new(t.trim()).as_str()));
        if terms.is_empty() || !covered {
            return None;
        }
        Some(Self {
            doc,
            category: category.into(),
            excerpt,
            context: context.into(),
            detected_at,
            terms,
        })
    }

    pub fn doc(&self) -> &Arc<Document> {
        &self.doc
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl PartialEq for Insight {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.doc, &other.doc)
            || (self.doc.source == other.doc.source && self.doc.location == other.doc.location))
            && self.category == other.category
            && self.excerpt == other.excerpt
            && self.context == other.context
            && self.detected_at == other.detected_at
            && self.terms == other.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn source_identity_is_name() {
        let a = Source::new("CalPERS", "https://a.example/board.pdf");
        let b = Source::new("CalPERS", "https://b.example/other.pdf").with_doc_type(DocType::Pdf);
        assert_eq!(a, b);
        let set: HashSet<Source> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn insight_serializes_doc_as_reference() {
        let src = Arc::new(Source::new("Fund", "file:///tmp/x.txt"));
        let doc = Arc::new(Document::new(
            src,
            Utc::now(),
            "/tmp/x.txt",
            "text/plain",
            "a very long body that must not leak into the output",
        ));
        let ins = Insight::new(
            doc,
            "rfp",
            "RFP issued.",
            "RFP issued.",
            Utc::now(),
            vec!["rfp".into()],
        )
        .unwrap();
        let json = serde_json::to_value(&ins).unwrap();
        assert_eq!(json["doc"]["source"], "Fund");
        assert_eq!(json["doc"]["location"], "/tmp/x.txt");
        assert!(!json.to_string().contains("must not leak"));
    }

    #[test]
    fn insight_requires_terms_present_in_excerpt() {
        let src = Arc::new(Source::new("Fund", "x"));
        let doc = Arc::new(Document::new(src, Utc::now(), "x", "text/plain", "body"));
        let build = |excerpt: &str, terms: Vec<&str>| {
            Insight::new(
                Arc::clone(&doc),
                "rfp",
                excerpt,
                excerpt,
                Utc::now(),
                terms.into_iter().map(String::from).collect(),
            )
        };
        assert!(build("An RFP was issued.", vec![]).is_none());
        assert!(build("An RFP was issued.", vec!["rfp", "manager search"]).is_none());
        assert!(build("A MANAGER\nSearch and RFP.", vec!["rfp", "manager search"]).is_some());
        assert!(build("Mandat à la SOCIÉTÉ GÉNÉRALE.", vec!["société générale"]).is_some());
    }

    #[test]
    fn normalized_constructor_cleans_text() {
        let src = Arc::new(Source::new("Fund", "x"));
        let doc = Document::normalized(src, Utc::now(), "x", "text/html", "<p>Hello&nbsp;there.</p>");
        assert_eq!(doc.text(), "Hello there.");
    }
}
