//! Shapes shared by the acoustic builder and searcher.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A fixed-length, non-negative codeword count vector.
pub type Histogram = Vec<f64>;

/// `term_idx (as string) -> ordered list of (doc_id, tfidf score)`.
pub type AcousticPostings = HashMap<String, Vec<(String, f64)>>;

/// `doc_id -> L2 norm of the document's TF-IDF vector`.
pub type AcousticDocNorms = HashMap<String, f64>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AcousticArtifacts {
    pub postings: AcousticPostings,
    /// Dense IDF vector of length K.
    pub idf: Vec<f64>,
    pub doc_norms: AcousticDocNorms,
}
