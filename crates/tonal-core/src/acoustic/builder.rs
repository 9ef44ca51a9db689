//! Two-pass acoustic index build (C5).
//!
//! Pass 1 computes document frequencies over the codeword vocabulary; pass
//! 2 turns each surviving histogram into a TF-IDF vector, its L2 norm, and
//! postings. A histogram with the wrong length, zero total count, or a
//! degenerate (all-zero) TF-IDF vector is a per-document error: it is
//! logged and skipped, with the skip counted in the build summary, rather
//! than aborting the build (spec.md §7 — only structural failures abort).

use std::collections::HashMap;

use tracing::{info, warn};

use crate::artifacts::write_atomic;
use crate::corpus::AudioDocument;
use crate::error::Result;

use super::types::{AcousticArtifacts, AcousticDocNorms, AcousticPostings};

pub struct AcousticIndexBuilder {
    k: usize,
    work_dir: std::path::PathBuf,
}

pub struct BuildSummary {
    pub artifacts: AcousticArtifacts,
    pub indexed: usize,
    pub skipped: usize,
}

impl AcousticIndexBuilder {
    pub fn new(k: usize, work_dir: impl Into<std::path::PathBuf>) -> Self {
        Self { k, work_dir: work_dir.into() }
    }

    pub fn build(&self, documents: &[AudioDocument]) -> Result<BuildSummary> {
        // Pass 1: document frequencies. Wrong-length histograms never reach
        // the vocabulary at all -- they're counted as skipped in pass 2.
        let mut df = vec![0u64; self.k];
        let mut n = 0u64;
        for doc in documents {
            if doc.counts.len() != self.k {
                continue;
            }
            let total: f64 = doc.counts.iter().sum();
            if total <= 0.0 {
                continue;
            }
            for (j, &count) in doc.counts.iter().enumerate() {
                if count > 0.0 {
                    df[j] += 1;
                }
            }
            n += 1;
        }

        info!(n, k = self.k, "acoustic index: pass 1 complete");

        // idf_j = log((N+1)/(df_j+1)) + 1 -- smoothed, never zero/negative.
        let idf: Vec<f64> =
            df.iter().map(|&d| ((n as f64 + 1.0) / (d as f64 + 1.0)).ln() + 1.0).collect();

        // Pass 2: postings + doc norms.
        let mut postings: AcousticPostings = HashMap::new();
        let mut doc_norms: AcousticDocNorms = HashMap::new();
        let mut indexed = 0usize;
        let mut skipped = 0usize;

        for doc in documents {
            if doc.counts.len() != self.k {
                warn!(
                    doc_id = %doc.doc_id,
                    len = doc.counts.len(),
                    expected = self.k,
                    "acoustic index: wrong histogram length, skipping"
                );
                skipped += 1;
                continue;
            }

            let total: f64 = doc.counts.iter().sum();
            if total <= 0.0 {
                skipped += 1;
                continue;
            }

            let tfidf: Vec<f64> =
                doc.counts.iter().zip(&idf).map(|(&c, &w)| (c / total) * w).collect();
            let norm = tfidf.iter().map(|v| v * v).sum::<f64>().sqrt();

            if norm <= 0.0 {
                warn!(doc_id = %doc.doc_id, "acoustic index: degenerate TF-IDF vector, skipping");
                skipped += 1;
                continue;
            }

            doc_norms.insert(doc.doc_id.clone(), norm);
            for (j, &score) in tfidf.iter().enumerate() {
                if score > 0.0 {
                    postings.entry(j.to_string()).or_default().push((doc.doc_id.clone(), score));
                }
            }
            indexed += 1;
        }

        info!(indexed, skipped, "acoustic index: pass 2 complete");

        let artifacts = AcousticArtifacts { postings, idf, doc_norms };
        write_atomic(&self.work_dir, "acoustic_postings.json", &artifacts.postings)?;
        write_atomic(&self.work_dir, "acoustic_idf.json", &artifacts.idf)?;
        write_atomic(&self.work_dir, "acoustic_doc_norms.json", &artifacts.doc_norms)?;

        Ok(BuildSummary { artifacts, indexed, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(id: &str, counts: Vec<f64>) -> AudioDocument {
        AudioDocument { doc_id: id.to_string(), counts }
    }

    #[test]
    fn skips_zero_total_histograms() {
        let dir = tempfile::tempdir().unwrap();
        let docs = vec![hist("1", vec![1.0, 0.0, 2.0]), hist("2", vec![0.0, 0.0, 0.0])];

        let summary = AcousticIndexBuilder::new(3, dir.path()).build(&docs).unwrap();
        assert_eq!(summary.indexed, 1);
        assert_eq!(summary.skipped, 1);
        assert!(summary.artifacts.doc_norms.contains_key("1"));
        assert!(!summary.artifacts.doc_norms.contains_key("2"));
    }

    #[test]
    fn empty_posting_lists_are_omitted() {
        let dir = tempfile::tempdir().unwrap();
        // Codeword index 1 never appears in any document.
        let docs = vec![hist("1", vec![1.0, 0.0, 2.0]), hist("2", vec![2.0, 0.0, 1.0])];

        let summary = AcousticIndexBuilder::new(3, dir.path()).build(&docs).unwrap();
        assert!(!summary.artifacts.postings.contains_key("1"));
        assert!(summary.artifacts.postings.contains_key("0"));
        assert!(summary.artifacts.postings.contains_key("2"));
    }

    #[test]
    fn idf_is_never_zero_or_negative() {
        let dir = tempfile::tempdir().unwrap();
        let docs = vec![hist("1", vec![5.0, 5.0]), hist("2", vec![5.0, 5.0])];
        let summary = AcousticIndexBuilder::new(2, dir.path()).build(&docs).unwrap();
        assert!(summary.artifacts.idf.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn wrong_length_histogram_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let docs = vec![hist("1", vec![1.0, 2.0]), hist("2", vec![1.0, 2.0, 3.0])];
        let summary = AcousticIndexBuilder::new(3, dir.path()).build(&docs).unwrap();
        assert_eq!(summary.indexed, 1);
        assert_eq!(summary.skipped, 1);
        assert!(!summary.artifacts.doc_norms.contains_key("1"));
        assert!(summary.artifacts.doc_norms.contains_key("2"));
    }

    #[test]
    fn doc_norms_are_positive_l2_norms() {
        let dir = tempfile::tempdir().unwrap();
        let docs = vec![hist("1", vec![3.0, 1.0, 0.0]), hist("2", vec![0.0, 2.0, 2.0])];
        let summary = AcousticIndexBuilder::new(3, dir.path()).build(&docs).unwrap();
        for norm in summary.artifacts.doc_norms.values() {
            assert!(*norm > 0.0);
            assert!(norm.is_finite());
        }
    }
}
