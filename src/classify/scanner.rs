// src/classify/scanner.rs
//! Text scanner: finds keyword occurrences per category, case-insensitively,
//! honoring word boundaries so that "plan" does not fire inside "planning".
//! Any whitespace run in the text (line breaks included) matches the single
//! space between phrase tokens.

use serde::Serialize;

use super::index::KeywordIndex;
use crate::text::FoldedText;

/// A single phrase occurrence. Offsets are byte offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub category: String,
    pub phrase: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Reject hits that start or end in the middle of a word.
    pub word_boundaries: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            word_boundaries: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner {
    opts: ScanOptions,
}

/// Scan with default options.
pub fn scan(text: &str, index: &KeywordIndex) -> Vec<Match> {
    Scanner::default().scan(text, index)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl Scanner {
    pub fn new(opts: ScanOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> ScanOptions {
        self.opts
    }

    /// One overlapping pass per category. Output is ordered by `(start, end)`,
    /// then by category order and phrase order of the index.
    pub fn scan(&self, text: &str, index: &KeywordIndex) -> Vec<Match> {
        if text.is_empty() {
            return Vec::new();
        }

        let folded = FoldedText::new(text);

        // (category_idx, pattern_idx, start, end) in original offsets
        let mut hits: Vec<(usize, usize, usize, usize)> = Vec::new();
        for (ci, entry) in index.entries().iter().enumerate() {
            for m in entry.matcher.find_overlapping_iter(folded.as_str()) {
                // skip hits that cut through the lowercase expansion of a char
                if !folded.is_char_aligned(m.start(), m.end()) {
                    continue;
                }
                let Some(range) = folded.original_range(m.start(), m.end()) else {
                    continue;
                };
                let (start, end) = (range.start, range.end);
                if self.opts.word_boundaries && !self.on_word_boundaries(text, start, end) {
                    continue;
                }
                hits.push((ci, m.pattern().as_usize(), start, end));
            }
        }

        hits.sort_by_key(|&(ci, pi, start, end)| (start, end, ci, pi));

        let entries = index.entries();
        hits.into_iter()
            .map(|(ci, pi, start, end)| Match {
                category: entries[ci].name.clone(),
                phrase: entries[ci].phrases[pi].clone(),
                start,
                end,
            })
            .collect()
    }

    /// A side is only checked when the hit itself begins/ends with a word char,
    /// so phrases like "value-add" or "s&p" still anchor sensibly.
    fn on_word_boundaries(&self, text: &str, start: usize, end: usize) -> bool {
        let hit = &text[start..end];
        let first = hit.chars().next();
        let last = hit.chars().next_back();

        if first.is_some_and(is_word_char)
            && text[..start].chars().next_back().is_some_and(is_word_char)
        {
            return false;
        }
        if last.is_some_and(is_word_char) && text[end..].chars().next().is_some_and(is_word_char)
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(pairs: Vec<(&str, Vec<&str>)>) -> KeywordIndex {
        KeywordIndex::build(pairs).expect("index")
    }

    #[test]
    fn finds_phrase_case_insensitively_with_offsets() {
        let index = idx(vec![("rfp", vec!["manager search"])]);
        let text = "Board approved a new MANAGER Search today.";
        let m = scan(text, &index);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].phrase, "manager search");
        assert_eq!(m[0].start, text.find("MANAGER").unwrap());
        assert_eq!(&text[m[0].start..m[0].end], "MANAGER Search");
    }

    #[test]
    fn non_ascii_phrase_matches_in_any_case() {
        let index = idx(vec![("rfp", vec!["Société Générale"])]);
        let text = "Mandate awarded to SOCIÉTÉ GÉNÉRALE today.";
        let m = scan(text, &index);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].phrase, "société générale");
        assert_eq!(&text[m[0].start..m[0].end], "SOCIÉTÉ GÉNÉRALE");
    }

    #[test]
    fn phrase_wrapped_across_lines_is_found() {
        let index = idx(vec![("rfp", vec!["manager search"])]);
        let text = "The board opened a manager\nsearch for real estate.";
        let m = scan(text, &index);
        assert_eq!(m.len(), 1);
        assert_eq!(&text[m[0].start..m[0].end], "manager\nsearch");

        let spaced = "a manager \t  search";
        assert_eq!(scan(spaced, &index).len(), 1);
    }

    #[test]
    fn plan_does_not_match_inside_planning() {
        let index = idx(vec![("allocation", vec!["plan"])]);
        assert!(scan("Our planning committee", &index).is_empty());
        assert_eq!(scan("Pacing remains on plan.", &index).len(), 1);
    }

    #[test]
    fn boundaries_can_be_disabled() {
        let index = idx(vec![("allocation", vec!["plan"])]);
        let loose = Scanner::new(ScanOptions {
            word_boundaries: false,
        });
        assert_eq!(loose.scan("Our planning committee", &index).len(), 1);
    }

    #[test]
    fn mark_is_not_found_in_benchmarking() {
        let index = idx(vec![("performance", vec!["mark", "benchmark"])]);
        let m = scan("Benchmarking vs benchmark.", &index);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].phrase, "benchmark");
    }

    #[test]
    fn overlapping_phrases_of_one_category_are_all_kept() {
        let index = idx(vec![("allocation", vec!["commitment", "commitments"])]);
        let m = scan("New commitments approved", &index);
        // "commitment" is cut mid-word by the trailing "s" → rejected;
        // with boundaries off both survive at the same start.
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].phrase, "commitments");

        let loose = Scanner::new(ScanOptions {
            word_boundaries: false,
        })
        .scan("New commitments approved", &index);
        assert_eq!(loose.len(), 2);
        assert_eq!(loose[0].start, loose[1].start);

        let index = idx(vec![("rfp", vec!["manager", "manager search"])]);
        let m = scan("a manager search", &index);
        assert_eq!(
            m.iter().map(|x| x.phrase.as_str()).collect::<Vec<_>>(),
            vec!["manager", "manager search"]
        );
    }

    #[test]
    fn punctuation_edged_phrases_match() {
        let index = idx(vec![("strategy", vec!["value-add"])]);
        let m = scan("A value-add, core-plus mandate", &index);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].end - m[0].start, "value-add".len());
    }

    #[test]
    fn empty_text_yields_nothing() {
        let index = idx(vec![("rfp", vec!["rfp"])]);
        assert!(scan("", &index).is_empty());
    }

    #[test]
    fn output_ordered_by_position_across_categories() {
        let index = idx(vec![("b", vec!["beta"]), ("a", vec!["alpha"])]);
        let m = scan("alpha then beta then alpha", &index);
        let cats: Vec<&str> = m.iter().map(|x| x.category.as_str()).collect();
        assert_eq!(cats, vec!["a", "b", "a"]);
    }
}
