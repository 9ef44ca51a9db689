//! Corpus ingestion: tabular text rows and line-delimited histogram
//! manifests. Rows/records with missing mandatory fields are dropped, per
//! spec.md §6 ("rows with any mandatory text field missing are dropped").
//! `doc_id`/`track_id` is canonicalized here, on write, so it agrees with
//! the canonicalization applied again at every query-time lookup.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use serde::Deserialize;

use crate::error::{IndexError, Result};
use crate::ident::normalize_track_id;

fn csv_io_error(path: &Path, err: csv::Error) -> IndexError {
    IndexError::io(path, std::io::Error::new(std::io::ErrorKind::Other, err))
}

/// A single text document: stable id plus one value per configured field.
#[derive(Clone, Debug)]
pub struct TextDocument {
    pub doc_id: String,
    pub fields: HashMap<String, String>,
}

/// Read a CSV corpus, keeping only rows where every field in `text_fields`
/// is present and non-empty. `id_column` must exist in the header or this
/// returns `InvalidCorpus`.
pub fn read_text_corpus(
    path: impl AsRef<Path>,
    id_column: &str,
    text_fields: &[String],
) -> Result<Vec<TextDocument>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_io_error(path, e))?;

    let headers = reader.headers().map_err(|e| csv_io_error(path, e.clone())).map(|h| h.clone())?;
    if !headers.iter().any(|h| h == id_column) {
        return Err(IndexError::InvalidCorpus { column: id_column.to_string() });
    }
    for field in text_fields {
        if !headers.iter().any(|h| h == field) {
            return Err(IndexError::InvalidCorpus { column: field.clone() });
        }
    }

    let mut docs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_io_error(path, e))?;
        let row: HashMap<&str, &str> =
            headers.iter().zip(record.iter()).collect();

        let Some(doc_id) = row.get(id_column).filter(|v| !v.is_empty()) else {
            continue;
        };

        let mut fields = HashMap::new();
        let mut complete = true;
        for field in text_fields {
            match row.get(field.as_str()).filter(|v| !v.is_empty()) {
                Some(value) => {
                    fields.insert(field.clone(), value.to_string());
                }
                None => {
                    complete = false;
                    break;
                }
            }
        }

        if complete {
            docs.push(TextDocument { doc_id: normalize_track_id(doc_id), fields });
        }
    }

    Ok(docs)
}

/// A single acoustic document: stable id plus a fixed-length codeword count
/// histogram.
#[derive(Clone, Debug, Deserialize)]
pub struct AudioDocument {
    pub doc_id: String,
    pub counts: Vec<f64>,
}

/// A source of per-track histograms, decoupling the acoustic builder from
/// any one on-disk manifest format. `LineDelimitedJson` is the shipped
/// implementation; a directory-of-per-track-files layout (as the original
/// Python builder used) is a second implementation a caller can drop in
/// without touching `AcousticIndexBuilder`.
pub trait HistogramSource {
    /// Read every histogram, validating each against `expected_len`.
    /// Malformed or wrong-length entries are skipped, not propagated as an
    /// error (spec.md §7: `InvalidHistogram` is a per-item skip at build
    /// time), and counted in the returned `skipped` total.
    fn read(&self, expected_len: usize) -> Result<(Vec<AudioDocument>, usize)>;
}

/// Line-delimited JSON manifest: one `{"doc_id": ..., "counts": [...]}`
/// object per line.
pub struct LineDelimitedJson<P: AsRef<Path>>(pub P);

impl<P: AsRef<Path>> HistogramSource for LineDelimitedJson<P> {
    fn read(&self, expected_len: usize) -> Result<(Vec<AudioDocument>, usize)> {
        let path = self.0.as_ref();
        let file = std::fs::File::open(path).map_err(|e| IndexError::io(path, e))?;
        let reader = std::io::BufReader::new(file);

        let mut docs = Vec::new();
        let mut skipped = 0usize;

        for line in reader.lines() {
            let line = line.map_err(|e| IndexError::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AudioDocument>(&line) {
                Ok(mut doc) if doc.counts.len() == expected_len => {
                    doc.doc_id = normalize_track_id(&doc.doc_id);
                    docs.push(doc);
                }
                _ => skipped += 1,
            }
        }

        Ok((docs, skipped))
    }
}

/// Convenience wrapper over [`LineDelimitedJson`] for the common case of a
/// single manifest path.
pub fn read_histogram_manifest(
    path: impl AsRef<Path>,
    expected_len: usize,
) -> Result<(Vec<AudioDocument>, usize)> {
    LineDelimitedJson(path).read(expected_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn drops_rows_missing_mandatory_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "track_id,lyrics,track_name").unwrap();
        writeln!(f, "000001,love forever,Song A").unwrap();
        writeln!(f, "000002,,Song B").unwrap();
        writeln!(f, "000003,nothing here,Song C").unwrap();
        drop(f);

        let fields = vec!["lyrics".to_string(), "track_name".to_string()];
        let docs = read_text_corpus(&path, "track_id", &fields).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.doc_id != "000002"));
    }

    #[test]
    fn missing_id_column_is_invalid_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.csv");
        std::fs::write(&path, "lyrics\nhello\n").unwrap();
        let err = read_text_corpus(&path, "track_id", &["lyrics".to_string()]).unwrap_err();
        assert!(matches!(err, IndexError::InvalidCorpus { .. }));
    }

    #[test]
    fn histogram_manifest_skips_wrong_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist.jsonl");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, r#"{{"doc_id":"000001","counts":[1.0,2.0,3.0]}}"#).unwrap();
        writeln!(f, r#"{{"doc_id":"000002","counts":[1.0]}}"#).unwrap();
        drop(f);

        let (docs, skipped) = read_histogram_manifest(&path, 3).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn histogram_source_trait_is_swappable_with_the_same_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist.jsonl");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, r#"{{"doc_id":"000001","counts":[1.0,2.0]}}"#).unwrap();
        drop(f);

        let source = LineDelimitedJson(&path);
        let (docs, skipped) = source.read(2).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(skipped, 0);
    }
}
