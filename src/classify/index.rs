// src/classify/index.rs
//! Keyword index: category → normalized phrase list, plus one compiled
//! multi-pattern matcher per category. Matchers run over folded text
//! (lowercased, whitespace runs collapsed), never over the raw document.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use std::fmt;

use super::error::{ConfigError, LookupError};
use crate::text::FoldedText;

/// Phrases of a single category and the automaton that finds them.
pub(crate) struct CategoryEntry {
    pub(crate) name: String,
    pub(crate) phrases: Vec<String>,
    pub(crate) matcher: AhoCorasick,
}

impl fmt::Debug for CategoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryEntry")
            .field("name", &self.name)
            .field("phrases", &self.phrases)
            .finish_non_exhaustive()
    }
}

/// Read-only category index. Cheap to share across workers behind an `Arc`.
#[derive(Debug)]
pub struct KeywordIndex {
    entries: Vec<CategoryEntry>,
}

/// Trim, lowercase and collapse inner whitespace.
///
/// Matches the folding applied to document text by [`FoldedText`], so a
/// normalized phrase can be searched for directly in the folded text.
pub fn normalize_phrase(raw: &str) -> String {
    FoldedText::new(raw.trim()).into_string()
}

impl KeywordIndex {
    /// Build from `(category, phrases)` pairs, keeping input order of categories.
    ///
    /// Empty and duplicate phrases are dropped per category; a repeated category
    /// merges into its first occurrence; categories left without phrases vanish.
    pub fn build<I, C, P, S>(map: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (C, P)>,
        C: AsRef<str>,
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut staged: Vec<(String, Vec<String>)> = Vec::new();

        for (category, phrases) in map {
            let name = category.as_ref().trim();
            if name.is_empty() {
                return Err(ConfigError::BlankCategory);
            }
            let pos = match staged.iter().position(|(n, _)| n == name) {
                Some(pos) => pos,
                None => {
                    staged.push((name.to_string(), Vec::new()));
                    staged.len() - 1
                }
            };
            let list = &mut staged[pos].1;
            for raw in phrases {
                let phrase = normalize_phrase(raw.as_ref());
                if !phrase.is_empty() && !list.contains(&phrase) {
                    list.push(phrase);
                }
            }
        }

        let entries = staged
            .into_iter()
            .filter(|(_, phrases)| !phrases.is_empty())
            .map(|(name, phrases)| {
                let matcher = AhoCorasickBuilder::new()
                    .match_kind(MatchKind::Standard)
                    .build(&phrases)
                    .map_err(|e| ConfigError::Automaton {
                        category: name.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(CategoryEntry {
                    name,
                    phrases,
                    matcher,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        if entries.is_empty() {
            return Err(ConfigError::EmptyIndex);
        }

        tracing::debug!(
            target: "classify",
            categories = entries.len(),
            phrases = entries.iter().map(|e| e.phrases.len()).sum::<usize>(),
            "keyword index built"
        );

        Ok(Self { entries })
    }

    /// Category names in insertion order.
    pub fn categories(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn phrases_for(&self, category: &str) -> Result<&[String], LookupError> {
        self.entries
            .iter()
            .find(|e| e.name == category)
            .map(|e| e.phrases.as_slice())
            .ok_or_else(|| LookupError::UnknownCategory(category.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(category, phrases)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.phrases.as_slice()))
    }

    pub(crate) fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_dedups_phrases() {
        let idx = KeywordIndex::build([(
            "rfp",
            vec!["  Request   for Proposal ", "RFP", "rfp", "", "   "],
        )])
        .unwrap();
        assert_eq!(
            idx.phrases_for("rfp").unwrap(),
            &["request for proposal".to_string(), "rfp".to_string()]
        );
    }

    #[test]
    fn non_ascii_phrases_are_fully_lowercased() {
        let idx = KeywordIndex::build([("rfp", vec!["Société  GÉNÉRALE"])]).unwrap();
        assert_eq!(
            idx.phrases_for("rfp").unwrap(),
            &["société générale".to_string()]
        );
    }

    #[test]
    fn keeps_insertion_order_and_merges_repeats() {
        let idx = KeywordIndex::build(vec![
            ("strategy", vec!["focus"]),
            ("allocation", vec!["pacing"]),
            ("strategy", vec!["Focus", "core"]),
        ])
        .unwrap();
        assert_eq!(idx.categories(), vec!["strategy", "allocation"]);
        assert_eq!(
            idx.phrases_for("strategy").unwrap(),
            &["focus".to_string(), "core".to_string()]
        );
    }

    #[test]
    fn drops_categories_without_phrases() {
        let idx = KeywordIndex::build(vec![("empty", vec![" "]), ("rfp", vec!["rfp"])]).unwrap();
        assert_eq!(idx.categories(), vec!["rfp"]);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn empty_input_is_config_error() {
        let none: Vec<(&str, Vec<&str>)> = Vec::new();
        assert_eq!(KeywordIndex::build(none).unwrap_err(), ConfigError::EmptyIndex);
        let blank_only = vec![("rfp", vec!["", "  "])];
        assert_eq!(
            KeywordIndex::build(blank_only).unwrap_err(),
            ConfigError::EmptyIndex
        );
    }

    #[test]
    fn blank_category_is_config_error() {
        let err = KeywordIndex::build(vec![("  ", vec!["x"])]).unwrap_err();
        assert_eq!(err, ConfigError::BlankCategory);
    }

    #[test]
    fn unknown_category_is_lookup_error() {
        let idx = KeywordIndex::build(vec![("rfp", vec!["rfp"])]).unwrap();
        assert_eq!(
            idx.phrases_for("nope").unwrap_err(),
            LookupError::UnknownCategory("nope".into())
        );
    }
}
