//! Text query-time ranking (C3): TF-IDF cosine, normalized on the document
//! side only.
//!
//! The query vector's own norm is intentionally never applied — this
//! matches `original_source/Indice_invertido/invertido_indice.py::search`,
//! which divides only by `doc_norms[doc_id]`. Textbook cosine would also
//! divide by `||q||`, but doing so changes every score by the same
//! multiplicative constant for a fixed query and therefore never changes
//! the ranking — the asymmetry is harmless to relative order and is kept
//! for reproducibility with the reference behavior (spec.md §9).

use std::collections::HashMap;

use crate::analyzer::Analyzer;

use super::types::TextArtifacts;

pub struct TextSearcher<'a> {
    artifacts: &'a TextArtifacts,
    analyzer: &'a Analyzer,
    default_fields: Vec<String>,
    /// When `true`, also divides by the query's own TF-IDF L2 norm —
    /// textbook symmetric cosine. Defaults to `false`: the documented
    /// behavior (spec.md §9) normalizes the document side only. Exposed as
    /// a toggle rather than flipped by default, since a fixed query's norm
    /// is a constant multiplier and never changes relative ranking, only
    /// the absolute score magnitude.
    symmetric: bool,
}

impl<'a> TextSearcher<'a> {
    pub fn new(artifacts: &'a TextArtifacts, analyzer: &'a Analyzer, default_fields: Vec<String>) -> Self {
        Self { artifacts, analyzer, default_fields, symmetric: false }
    }

    pub fn with_symmetric_normalization(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    /// `search(query, top_k, fields?) -> [(doc_id, score)]`, sorted
    /// descending by score, ties broken by ascending `doc_id`.
    pub fn search(&self, query: &str, top_k: usize, fields: Option<&[String]>) -> Vec<(String, f64)> {
        let fields: Vec<String> = fields.map(|f| f.to_vec()).unwrap_or_else(|| self.default_fields.clone());
        let terms = self.analyzer.analyze_query(query, &fields);

        let mut query_counts: HashMap<String, u32> = HashMap::new();
        for term in &terms {
            *query_counts.entry(term.clone()).or_insert(0) += 1;
        }

        let mut scores: HashMap<String, f64> = HashMap::new();
        for term in query_counts.keys() {
            let Some(postings) = self.artifacts.postings.get(term) else { continue };
            let idf = self.artifacts.idf.get(term).copied().unwrap_or(0.0);
            for (doc_id, count) in postings {
                let tf = (1.0 + *count as f64).log10();
                *scores.entry(doc_id.clone()).or_insert(0.0) += tf * idf;
            }
        }

        let query_norm = if self.symmetric {
            query_counts
                .iter()
                .map(|(term, count)| {
                    let idf = self.artifacts.idf.get(term).copied().unwrap_or(0.0);
                    let weight = (1.0 + *count as f64).log10() * idf;
                    weight * weight
                })
                .sum::<f64>()
                .sqrt()
        } else {
            1.0
        };

        let mut results: Vec<(String, f64)> = scores
            .into_iter()
            .filter_map(|(doc_id, score)| {
                let doc_norm = self.artifacts.doc_norms.get(&doc_id).copied().unwrap_or(0.0);
                if doc_norm <= 0.0 {
                    return None;
                }
                if self.symmetric && query_norm <= 0.0 {
                    return None;
                }
                Some((doc_id, score / (doc_norm * query_norm)))
            })
            .collect();

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));
        results.truncate(top_k);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::TextDocument;
    use crate::text::builder::TextIndexBuilder;
    use std::collections::HashMap as StdHashMap;

    fn doc(id: &str, lyrics: &str) -> TextDocument {
        let mut fields = StdHashMap::new();
        fields.insert("lyrics".to_string(), lyrics.to_string());
        TextDocument { doc_id: id.to_string(), fields }
    }

    #[test]
    fn scenario_love_query_returns_docs_one_and_two() {
        let docs = vec![
            doc("1", "love forever"),
            doc("2", "dance with me love"),
            doc("3", "nothing here"),
        ];

        let dir = tempfile::tempdir().unwrap();
        let analyzer = Analyzer::new(None, &[]);
        let builder = TextIndexBuilder::new(Analyzer::new(None, &[]), vec!["lyrics".to_string()], 500, dir.path());
        let artifacts = builder.build(&docs).unwrap();

        let searcher = TextSearcher::new(&artifacts, &analyzer, vec!["lyrics".to_string()]);
        let results = searcher.search("love", 2, None);

        assert_eq!(results.len(), 2);
        let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert!(ids.contains(&"1"));
        assert!(ids.contains(&"2"));
        assert!(!ids.contains(&"3"));
        for (_, score) in &results {
            assert!(score.is_finite());
            assert!(*score > 0.0);
        }
    }

    #[test]
    fn query_with_no_matching_terms_returns_empty() {
        let docs = vec![doc("1", "love forever")];
        let dir = tempfile::tempdir().unwrap();
        let analyzer = Analyzer::new(None, &[]);
        let builder = TextIndexBuilder::new(Analyzer::new(None, &[]), vec!["lyrics".to_string()], 500, dir.path());
        let artifacts = builder.build(&docs).unwrap();

        let searcher = TextSearcher::new(&artifacts, &analyzer, vec!["lyrics".to_string()]);
        assert!(searcher.search("xyzzy", 10, None).is_empty());
    }

    #[test]
    fn ties_break_by_ascending_doc_id() {
        let docs = vec![doc("2", "love love"), doc("1", "love love")];
        let dir = tempfile::tempdir().unwrap();
        let analyzer = Analyzer::new(None, &[]);
        let builder = TextIndexBuilder::new(Analyzer::new(None, &[]), vec!["lyrics".to_string()], 500, dir.path());
        let artifacts = builder.build(&docs).unwrap();

        let searcher = TextSearcher::new(&artifacts, &analyzer, vec!["lyrics".to_string()]);
        let results = searcher.search("love", 10, None);
        assert_eq!(results[0].0, "1");
        assert_eq!(results[1].0, "2");
    }

    #[test]
    fn symmetric_normalization_preserves_ranking_order() {
        let docs = vec![doc("1", "love forever"), doc("2", "dance with me love")];
        let dir = tempfile::tempdir().unwrap();
        let analyzer = Analyzer::new(None, &[]);
        let builder = TextIndexBuilder::new(Analyzer::new(None, &[]), vec!["lyrics".to_string()], 500, dir.path());
        let artifacts = builder.build(&docs).unwrap();

        let asymmetric = TextSearcher::new(&artifacts, &analyzer, vec!["lyrics".to_string()]);
        let symmetric = TextSearcher::new(&artifacts, &analyzer, vec!["lyrics".to_string()])
            .with_symmetric_normalization(true);

        let a = asymmetric.search("love forever", 10, None);
        let b = symmetric.search("love forever", 10, None);

        let a_ids: Vec<&str> = a.iter().map(|(id, _)| id.as_str()).collect();
        let b_ids: Vec<&str> = b.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(a_ids, b_ids);
        for (_, score) in &b {
            assert!(score.is_finite());
        }
    }
}
