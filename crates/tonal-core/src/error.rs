//! The single error seam for every `tonal-core` public operation.
//!
//! Build-time failures on a single document/histogram are logged and
//! skipped by the caller rather than surfaced here (see the builders'
//! `skipped` counters); only structural failures reach an `IndexError`.

use std::path::PathBuf;

/// Degenerate queries (all-zero vector, no matching terms) are not modeled
/// as an error variant — per spec they return an empty result. This type
/// covers everything that *is* an error.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("artifact I/O failure at {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corpus is missing required column {column:?}")]
    InvalidCorpus { column: String },

    #[error("invalid histogram: {reason}")]
    InvalidHistogram { reason: String },

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("metadata store error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("artifact deserialization failure: {0}")]
    Serde(#[from] serde_json::Error),
}

impl IndexError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        IndexError::IoFailure { path: path.as_ref().to_path_buf(), source }
    }

    pub fn invalid_query(reason: impl Into<String>) -> Self {
        IndexError::InvalidQuery { reason: reason.into() }
    }

    pub fn invalid_histogram(reason: impl Into<String>) -> Self {
        IndexError::InvalidHistogram { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
