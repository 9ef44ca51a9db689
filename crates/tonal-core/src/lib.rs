//! Tonal core — multimodal music retrieval: a SPIMI-built text inverted
//! index, an acoustic codeword inverted index, a SQL-like metadata query
//! layer, and audio/metadata score fusion, each ranked by TF-IDF cosine.

pub mod acoustic;
pub mod analyzer;
pub mod artifacts;
pub mod config;
pub mod corpus;
pub mod error;
pub mod fusion;
pub mod ident;
pub mod metadata;
pub mod text;

pub use analyzer::Analyzer;
pub use config::Config;
pub use error::{IndexError, Result};
pub use fusion::{FusedResult, FusionEngine};
pub use ident::normalize_track_id;
