//! Runtime configuration, loaded from `tonal.toml` or defaults.
//!
//! Mirrors the teacher crate's `ScanConfig`: a `new()`/`Default` pair that
//! seeds sane built-ins, with the on-disk file layered on top when present.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};

/// Build-time constant: codeword vocabulary size for the acoustic index.
/// Must agree between the codebook, every histogram, and the IDF vector.
pub const DEFAULT_CODEBOOK_SIZE: usize = 128;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding SPIMI temp blocks, final postings, norms, IDF.
    pub text_index_dir: PathBuf,
    /// Directory holding acoustic postings, norms, IDF.
    pub acoustic_index_dir: PathBuf,
    /// Path to the metadata SQLite database.
    pub metadata_db_path: PathBuf,
    /// Text fields to index, in priority order (first is the default query field).
    pub text_fields: Vec<String>,
    /// Documents accumulated in memory before a SPIMI block flush.
    pub block_limit: usize,
    /// Acoustic codeword vocabulary size (K).
    pub codebook_size: usize,
    /// Default fusion mixing weight.
    pub fusion_alpha: f64,
    /// Extra stopwords beyond the built-in English list and punctuation glyphs.
    pub extra_stopwords: Vec<String>,
    /// Optional user stoplist file, one token per line (spec.md §6). A
    /// missing path is not an error — the built-in glyphs still apply.
    pub stoplist_path: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file, falling back to defaults for any field
    /// the file doesn't set. A missing file is not an error — defaults apply.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|e| {
                IndexError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(IndexError::io(path, e)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            text_index_dir: PathBuf::from("index/text"),
            acoustic_index_dir: PathBuf::from("index/acoustic"),
            metadata_db_path: PathBuf::from("metadata.db"),
            text_fields: vec![
                "lyrics".to_string(),
                "track_name".to_string(),
                "track_artist".to_string(),
                "playlist_genre".to_string(),
            ],
            block_limit: 500,
            codebook_size: DEFAULT_CODEBOOK_SIZE,
            fusion_alpha: 0.7,
            extra_stopwords: Vec::new(),
            stoplist_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_fields() {
        let cfg = Config::default();
        assert_eq!(cfg.codebook_size, 128);
        assert!(cfg.text_fields.contains(&"lyrics".to_string()));
        assert_eq!(cfg.block_limit, 500);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let cfg = Config::load("/nonexistent/tonal.toml").unwrap();
        assert_eq!(cfg.fusion_alpha, 0.7);
    }

    #[test]
    fn loads_partial_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tonal.toml");
        std::fs::write(&path, "block_limit = 10\nfusion_alpha = 0.5\n").unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.block_limit, 10);
        assert_eq!(cfg.fusion_alpha, 0.5);
        assert_eq!(cfg.codebook_size, 128);
    }

    #[test]
    fn malformed_toml_is_an_io_failure_not_invalid_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tonal.toml");
        std::fs::write(&path, "block_limit = [this is not valid toml").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, IndexError::IoFailure { .. }));
    }
}
