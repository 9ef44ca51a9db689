//! Text analysis (C1): lowercase, tokenize, stoplist-filter, stem,
//! field-qualify. Pure and deterministic — the same function is used to
//! analyze documents at build time and queries at search time, so the two
//! sides never drift.

use std::collections::HashSet;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::sync::LazyLock;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// Punctuation glyphs always treated as stopwords, regardless of the
/// user-provided stoplist (spec.md §6).
const BUILTIN_STOP_GLYPHS: [&str; 8] = ["?", "-", ".", ":", ",", "!", ";", "_"];

pub struct Analyzer {
    stemmer: Stemmer,
    stoplist: HashSet<String>,
}

impl Analyzer {
    /// Build an analyzer from an optional user stoplist file (one token per
    /// line, case-insensitive) plus `extra_stopwords` from config. A missing
    /// stoplist file is not an error — the built-in glyphs still apply.
    pub fn new(stoplist_path: Option<&std::path::Path>, extra_stopwords: &[String]) -> Self {
        let mut stoplist: HashSet<String> =
            stop_words::get(stop_words::LANGUAGE::English).into_iter().collect();

        if let Some(path) = stoplist_path {
            if let Ok(contents) = std::fs::read_to_string(path) {
                for line in contents.lines() {
                    let word = line.trim().to_lowercase();
                    if !word.is_empty() {
                        stoplist.insert(word);
                    }
                }
            }
        }

        for word in extra_stopwords {
            stoplist.insert(word.trim().to_lowercase());
        }

        for glyph in BUILTIN_STOP_GLYPHS {
            stoplist.insert(glyph.to_string());
        }

        Self { stemmer: Stemmer::create(Algorithm::English), stoplist }
    }

    /// `analyze(text, field) -> ordered sequence of "field:stem" terms`.
    pub fn analyze(&self, text: &str, field: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        WORD_RE
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|word| self.keep(word))
            .map(|word| format!("{field}:{}", self.stemmer.stem(word)))
            .collect()
    }

    /// Analyze a query string against one or more fields, producing the
    /// cross-product of stems and field qualifiers (matches the original
    /// `_preprocess_query` behavior: every stem is emitted once per field).
    pub fn analyze_query(&self, text: &str, fields: &[String]) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut out = Vec::new();
        for m in WORD_RE.find_iter(&lower) {
            let word = m.as_str();
            if !self.keep(word) {
                continue;
            }
            let stem = self.stemmer.stem(word);
            for field in fields {
                out.push(format!("{field}:{stem}"));
            }
        }
        out
    }

    fn keep(&self, word: &str) -> bool {
        word.is_ascii()
            && word.len() >= 2
            && word.chars().all(|c| c.is_ascii_alphabetic())
            && !self.stoplist.contains(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> Analyzer {
        Analyzer::new(None, &[])
    }

    #[test]
    fn emits_field_qualified_stems() {
        let a = analyzer();
        let terms = a.analyze("Loving the forever dance", "lyrics");
        assert!(terms.iter().all(|t| t.starts_with("lyrics:")));
        assert!(!terms.is_empty());
    }

    #[test]
    fn drops_short_and_numeric_and_punct_tokens() {
        let a = analyzer();
        let terms = a.analyze("a 99 ok! -- hi", "lyrics");
        // "a" too short, "99" non-alphabetic, punctuation stripped by \w+,
        // "ok" kept, "hi" too short (len 2 is allowed -> kept)
        assert!(terms.contains(&"lyrics:ok".to_string()) || terms.iter().any(|t| t.contains("ok")));
        assert!(!terms.iter().any(|t| t.contains('9')));
    }

    #[test]
    fn is_deterministic() {
        let a = analyzer();
        let once = a.analyze("love forever dance", "lyrics");
        let twice = a.analyze("love forever dance", "lyrics");
        assert_eq!(once, twice);
    }

    #[test]
    fn query_analysis_cross_products_fields() {
        let a = analyzer();
        let fields = vec!["lyrics".to_string(), "track_name".to_string()];
        let terms = a.analyze_query("love", &fields);
        assert_eq!(terms.len(), 2);
        assert!(terms.iter().any(|t| t.starts_with("lyrics:")));
        assert!(terms.iter().any(|t| t.starts_with("track_name:")));
    }

    #[test]
    fn respects_user_stoplist() {
        let a = Analyzer::new(None, &["forever".to_string()]);
        let terms = a.analyze("love forever", "lyrics");
        assert!(!terms.iter().any(|t| t.contains("forever")));
    }
}
