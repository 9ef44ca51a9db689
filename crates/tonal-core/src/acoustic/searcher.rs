//! Acoustic query-time ranking (C6): TF-IDF cosine between a query
//! histogram and the indexed postings, fully normalized on both sides.
//!
//! Unlike the text searcher, this one divides by the query's own L2 norm
//! too — the query here is a single dense histogram rather than a handful
//! of tokens, so normalizing it costs nothing and matches
//! `original_source/audio/index/inverted/search_inverted.py::search`
//! exactly.

use std::collections::HashMap;

use super::types::AcousticArtifacts;

pub struct AcousticSearcher<'a> {
    artifacts: &'a AcousticArtifacts,
}

impl<'a> AcousticSearcher<'a> {
    pub fn new(artifacts: &'a AcousticArtifacts) -> Self {
        Self { artifacts }
    }

    /// `search(histogram, top_k, min_score) -> [(doc_id, score)]`, sorted
    /// descending by score, ties broken by ascending `doc_id`. A histogram
    /// that sums to zero (or whose TF-IDF vector is all zero) yields no
    /// matches rather than an error.
    pub fn search(&self, histogram: &[f64], top_k: usize, min_score: f64) -> Vec<(String, f64)> {
        let total: f64 = histogram.iter().sum();
        if total <= 0.0 {
            return Vec::new();
        }

        let tfidf: Vec<f64> = histogram
            .iter()
            .zip(self.artifacts.idf.iter())
            .map(|(&c, &w)| (c / total) * w)
            .collect();
        let query_norm = tfidf.iter().map(|v| v * v).sum::<f64>().sqrt();
        if query_norm <= 0.0 {
            return Vec::new();
        }

        let mut scores: HashMap<String, f64> = HashMap::new();
        for (j, &weight) in tfidf.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            let Some(postings) = self.artifacts.postings.get(&j.to_string()) else { continue };
            for (doc_id, doc_weight) in postings {
                *scores.entry(doc_id.clone()).or_insert(0.0) += weight * doc_weight;
            }
        }

        let mut results: Vec<(String, f64)> = scores
            .into_iter()
            .filter_map(|(doc_id, dot)| {
                let doc_norm = self.artifacts.doc_norms.get(&doc_id).copied().unwrap_or(0.0);
                if doc_norm <= 0.0 {
                    return None;
                }
                let score = dot / (query_norm * doc_norm);
                (score >= min_score).then_some((doc_id, score))
            })
            .collect();

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));
        results.truncate(top_k);
        results
    }

    /// `audio_search_by_id(doc_id, top_k)`: use an already-indexed track's
    /// own TF-IDF weights as the query, ranking every other indexed track
    /// against it. `doc_id` is matched as given — callers normalize the
    /// track id first so that e.g. `"34996"` and `"034996"` resolve to the
    /// same artifact (spec.md §8 scenario 6).
    pub fn search_by_id(&self, doc_id: &str, top_k: usize, min_score: f64) -> Vec<(String, f64)> {
        let query_norm = match self.artifacts.doc_norms.get(doc_id) {
            Some(&n) if n > 0.0 => n,
            _ => return Vec::new(),
        };

        let mut scores: HashMap<String, f64> = HashMap::new();
        for postings in self.artifacts.postings.values() {
            let Some((_, query_weight)) = postings.iter().find(|(id, _)| id == doc_id) else { continue };
            for (candidate_id, candidate_weight) in postings {
                if candidate_id == doc_id {
                    continue;
                }
                *scores.entry(candidate_id.clone()).or_insert(0.0) += query_weight * candidate_weight;
            }
        }

        let mut results: Vec<(String, f64)> = scores
            .into_iter()
            .filter_map(|(candidate_id, dot)| {
                let doc_norm = self.artifacts.doc_norms.get(&candidate_id).copied().unwrap_or(0.0);
                if doc_norm <= 0.0 {
                    return None;
                }
                let score = dot / (query_norm * doc_norm);
                (score >= min_score).then_some((candidate_id, score))
            })
            .collect();

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));
        results.truncate(top_k);
        results
    }
}
