//! Shapes shared by the text builder and searcher.
//!
//! Design note (spec.md §9): the flat, append-only posting list is the
//! on-disk shape; the `HashMap<term, HashMap<doc_id, count>>` is the
//! in-memory shape used for random access at query time. `PostingMap`
//! serializes as the map shape directly (string-keyed maps loaded whole
//! into memory are acceptable at this corpus size, per the design note).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `term -> (doc_id -> count)`.
pub type PostingMap = HashMap<String, HashMap<String, u32>>;

/// `term -> idf`.
pub type Idf = HashMap<String, f64>;

/// `doc_id -> L2 norm of the document's TF-IDF vector`.
pub type DocNorms = HashMap<String, f64>;

/// The three artifacts produced by a text index build, held together so a
/// loaded index is always internally consistent (same build, same N).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TextArtifacts {
    pub postings: PostingMap,
    pub idf: Idf,
    pub doc_norms: DocNorms,
}

impl TextArtifacts {
    /// Document frequency of a term: the size of its posting list, or 0 if
    /// the term is absent (spec.md §8: `|postings[t]| = df[t]`).
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, |p| p.len())
    }
}
