// src/text.rs
//! Text helpers shared by feeds and the extractor: normalization of extracted
//! document text, sentence segmentation, and UTF-8 safe offset snapping.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::ops::Range;

/// Normalize extracted document text.
///
/// Unlike headline normalization this keeps sentence punctuation and paragraph
/// breaks, since excerpts are cut along sentence boundaries.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Block-level tags become line breaks, remaining tags are dropped
    static RE_BLOCK: OnceCell<Regex> = OnceCell::new();
    let re_block = RE_BLOCK.get_or_init(|| {
        Regex::new(r"(?i)</?(p|br|div|li|ul|ol|tr|table|h[1-6]|section|article)\b[^>]*>")
            .unwrap()
    });
    out = re_block.replace_all(&out, "\n").to_string();
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse horizontal whitespace (incl. NBSP), trim lines, cap blank runs
    out = out.replace("\r\n", "\n").replace('\r', "\n");
    static RE_HWS: OnceCell<Regex> = OnceCell::new();
    let re_hws = RE_HWS.get_or_init(|| Regex::new(r"[ \t\x0B\x0C\u{00A0}]+").unwrap());
    out = re_hws.replace_all(&out, " ").to_string();
    out = out.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    static RE_BLANK: OnceCell<Regex> = OnceCell::new();
    let re_blank = RE_BLANK.get_or_init(|| Regex::new(r"\n{3,}").unwrap());
    out = re_blank.replace_all(&out, "\n\n").to_string();

    out.trim().to_string()
}

/// Split `text` into contiguous sentence spans (byte ranges) that cover it fully.
///
/// A sentence ends after `.`, `!` or `?` (plus closing quotes/brackets) when
/// followed by whitespace or end of text, and after every line break.
pub fn sentence_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans: Vec<Range<usize>> = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let mut end = i + c.len_utf8();
        let boundary = match c {
            '\n' => true,
            '.' | '!' | '?' => {
                while let Some(&(j, n)) = chars.peek() {
                    if matches!(n, '"' | '\'' | ')' | ']') {
                        chars.next();
                        end = j + n.len_utf8();
                    } else {
                        break;
                    }
                }
                chars.peek().map_or(true, |&(_, n)| n.is_whitespace())
            }
            _ => false,
        };
        if boundary {
            // whitespace-only tails fold into the previous sentence
            match spans.last_mut() {
                Some(prev) if text[start..end].trim().is_empty() => prev.end = end,
                _ => spans.push(start..end),
            }
            start = end;
        }
    }
    if start < text.len() {
        match spans.last_mut() {
            Some(prev) if text[start..].trim().is_empty() => prev.end = text.len(),
            _ => spans.push(start..text.len()),
        }
    }
    spans
}

/// Index of the sentence containing byte `offset` (clamped to the last sentence).
pub fn sentence_at(spans: &[Range<usize>], offset: usize) -> usize {
    spans
        .partition_point(|r| r.end <= offset)
        .min(spans.len().saturating_sub(1))
}

/// Largest char boundary `<= idx`.
pub fn floor_char_boundary(text: &str, idx: usize) -> usize {
    let mut i = idx.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary `>= idx`.
pub fn ceil_char_boundary(text: &str, idx: usize) -> usize {
    let mut i = idx.min(text.len());
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Trim whitespace from both ends of `range` within `text`.
pub fn trim_range(text: &str, range: Range<usize>) -> Range<usize> {
    let slice = &text[range.clone()];
    let lead = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    if lead == slice.len() {
        return range.start..range.start;
    }
    (range.start + lead)..(range.end - trail)
}

/// Matching view of a text: lowercased, with every whitespace run reduced to
/// one space. Each folded byte remembers the source char it came from, so
/// folded ranges map back onto the original text.
#[derive(Debug, Clone)]
pub struct FoldedText {
    folded: String,
    // per folded byte: byte range of the originating char (or whitespace run)
    origin: Vec<(usize, usize)>,
}

impl FoldedText {
    pub fn new(text: &str) -> Self {
        let mut folded = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());
        let mut chars = text.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if c.is_whitespace() {
                let mut end = i + c.len_utf8();
                while let Some(&(j, n)) = chars.peek() {
                    if !n.is_whitespace() {
                        break;
                    }
                    end = j + n.len_utf8();
                    chars.next();
                }
                folded.push(' ');
                origin.push((i, end));
                continue;
            }
            let span = (i, i + c.len_utf8());
            for lc in c.to_lowercase() {
                folded.push(lc);
                origin.extend(std::iter::repeat(span).take(lc.len_utf8()));
            }
        }
        Self { folded, origin }
    }

    pub fn as_str(&self) -> &str {
        &self.folded
    }

    pub fn into_string(self) -> String {
        self.folded
    }

    /// Original byte range covered by folded bytes `start..end`.
    pub fn original_range(&self, start: usize, end: usize) -> Option<Range<usize>> {
        if start >= end || end > self.origin.len() {
            return None;
        }
        Some(self.origin[start].0..self.origin[end - 1].1)
    }

    /// True when `start..end` covers whole source chars, not a piece of a
    /// multi-char lowercase expansion.
    pub fn is_char_aligned(&self, start: usize, end: usize) -> bool {
        let o = &self.origin;
        if start >= end || end > o.len() {
            return false;
        }
        let head = start == 0 || o[start - 1] != o[start];
        let tail = end == o.len() || o[end] != o[end - 1];
        head && tail
    }
}
