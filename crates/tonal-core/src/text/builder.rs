//! SPIMI-style external-memory index build (C2).
//!
//! Three phases: blocking (accumulate in RAM, flush sorted blocks every
//! `block_limit` documents), a logarithmic merge cascade, and an IDF +
//! doc-norm pass over the merged postings. The final artifact is written
//! via the atomic scratch-then-rename protocol (C9); temp blocks are
//! removed on success and left on disk on failure for forensics.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::analyzer::Analyzer;
use crate::artifacts::{self, write_atomic};
use crate::corpus::TextDocument;
use crate::error::{IndexError, Result};

use super::types::{DocNorms, Idf, PostingMap, TextArtifacts};

/// `term -> (doc_id -> count)`, sorted by term for deterministic block
/// serialization.
type Block = BTreeMap<String, HashMap<String, u32>>;

pub struct TextIndexBuilder {
    analyzer: Analyzer,
    text_fields: Vec<String>,
    block_limit: usize,
    work_dir: PathBuf,
}

impl TextIndexBuilder {
    pub fn new(
        analyzer: Analyzer,
        text_fields: Vec<String>,
        block_limit: usize,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self { analyzer, text_fields, block_limit: block_limit.max(1), work_dir: work_dir.into() }
    }

    /// Run the full build pipeline and return the in-memory artifacts
    /// (already persisted to `work_dir`).
    pub fn build(&self, documents: &[TextDocument]) -> Result<TextArtifacts> {
        // Leftovers from a prior failed build are cleared before we start,
        // not after — a fresh build invalidates older artifacts/blocks.
        artifacts::clear_temp_blocks(&self.work_dir)?;
        std::fs::create_dir_all(&self.work_dir).map_err(|e| IndexError::io(&self.work_dir, e))?;

        let analyzed = self.analyze_documents(documents);
        let block_count = self.blocking_phase(&analyzed)?;

        if block_count == 0 {
            let artifacts = TextArtifacts::default();
            self.persist(&artifacts)?;
            return Ok(artifacts);
        }

        info!(block_count, "SPIMI: starting merge cascade");
        let postings = self.merge_cascade(block_count)?;

        let idf = compute_idf(&postings, documents.len());
        let doc_norms = compute_doc_norms(&postings, &idf);
        let artifacts = TextArtifacts { postings, idf, doc_norms };

        self.persist(&artifacts)?;
        artifacts::clear_temp_blocks(&self.work_dir)?;

        Ok(artifacts)
    }

    /// Per-document analysis, parallelized across worker threads. The
    /// block-flush and merge phases below stay strictly sequential.
    fn analyze_documents(&self, documents: &[TextDocument]) -> Vec<(String, HashMap<String, u32>)> {
        documents
            .par_iter()
            .map(|doc| {
                let mut counts: HashMap<String, u32> = HashMap::new();
                for field in &self.text_fields {
                    if let Some(text) = doc.fields.get(field) {
                        for term in self.analyzer.analyze(text, field) {
                            *counts.entry(term).or_insert(0) += 1;
                        }
                    }
                }
                (doc.doc_id.clone(), counts)
            })
            .collect()
    }

    /// Accumulate term->(doc_id->count) in memory, flushing a sorted block
    /// file every `block_limit` documents, plus a final partial flush.
    /// Returns the number of blocks written.
    fn blocking_phase(&self, analyzed: &[(String, HashMap<String, u32>)]) -> Result<usize> {
        let mut block_count = 0usize;
        let mut current: Block = BTreeMap::new();

        for (i, (doc_id, counts)) in analyzed.iter().enumerate() {
            for (term, count) in counts {
                current.entry(term.clone()).or_default().insert(doc_id.clone(), *count);
            }

            if (i + 1) % self.block_limit == 0 {
                self.flush_block(&current, block_count)?;
                current.clear();
                block_count += 1;
            }
        }

        if !current.is_empty() {
            self.flush_block(&current, block_count)?;
            block_count += 1;
        }

        Ok(block_count)
    }

    fn flush_block(&self, block: &Block, index: usize) -> Result<()> {
        let path = self.work_dir.join(artifacts::temp_block_name(index));
        debug!(?path, terms = block.len(), "flushing SPIMI block");
        let bytes = serde_json::to_vec(block)?;
        std::fs::write(&path, bytes).map_err(|e| IndexError::io(&path, e))?;
        Ok(())
    }

    fn load_block(&self, index: usize) -> Result<Option<Block>> {
        let path = self.work_dir.join(artifacts::temp_block_name(index));
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IndexError::io(&path, e)),
        }
    }

    /// Logarithmic cascade: for level = 1..=ceil(log2 B), step = 2^level;
    /// each window `[i, min(i+step-1, B-1)]` merges into the block at the
    /// window start. Consumed non-start blocks are removed immediately so
    /// later levels never re-read (and double-count) them.
    fn merge_cascade(&self, block_count: usize) -> Result<PostingMap> {
        let levels = ((block_count as f64).log2().ceil() as u32).max(1);

        for level in 1..=levels {
            let step = 1usize << level;
            let mut i = 0;
            while i < block_count {
                let start = i;
                let finish = (i + step - 1).min(block_count - 1);
                if finish > start {
                    self.merge_window(start, finish)?;
                }
                i += step;
            }
        }

        let final_path = self.work_dir.join(artifacts::temp_block_name(0));
        let bytes = std::fs::read(&final_path).map_err(|e| IndexError::io(&final_path, e))?;
        let postings: PostingMap =
            serde_json::from_slice::<Block>(&bytes)?.into_iter().collect();
        Ok(postings)
    }

    fn merge_window(&self, start: usize, finish: usize) -> Result<()> {
        let mut merged: Block = BTreeMap::new();
        for i in start..=finish {
            let Some(block) = self.load_block(i)? else { continue };
            for (term, postings) in block {
                let entry = merged.entry(term).or_default();
                for (doc_id, count) in postings {
                    // Commutative/associative union: SPIMI blocks never
                    // share a doc_id under the same term, but summing
                    // keeps the merge correct even if they did.
                    *entry.entry(doc_id).or_insert(0) += count;
                }
            }
            if i != start {
                let path = self.work_dir.join(artifacts::temp_block_name(i));
                std::fs::remove_file(&path).map_err(|e| IndexError::io(&path, e))?;
            }
        }
        self.flush_block(&merged, start)
    }

    fn persist(&self, artifacts: &TextArtifacts) -> Result<()> {
        write_atomic(&self.work_dir, "final_postings.json", &artifacts.postings)?;
        write_atomic(&self.work_dir, "idf.json", &artifacts.idf)?;
        write_atomic(&self.work_dir, "doc_norms.json", &artifacts.doc_norms)?;
        Ok(())
    }
}

fn compute_idf(postings: &PostingMap, total_docs: usize) -> Idf {
    postings
        .iter()
        .map(|(term, docs)| {
            let df = docs.len().max(1);
            (term.clone(), (total_docs as f64 / df as f64).log10())
        })
        .collect()
}

fn compute_doc_norms(postings: &PostingMap, idf: &Idf) -> DocNorms {
    let mut sums: DocNorms = HashMap::new();
    for (term, docs) in postings {
        let term_idf = idf.get(term).copied().unwrap_or(0.0);
        for (doc_id, count) in docs {
            let weight = (1.0 + *count as f64).log10() * term_idf;
            *sums.entry(doc_id.clone()).or_insert(0.0) += weight * weight;
        }
    }
    for norm in sums.values_mut() {
        *norm = norm.sqrt();
    }
    sums
}
