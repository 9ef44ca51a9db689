//! Acoustic inverted index (C4, C5, C6): codeword histogram "bag of
//! words", TF-IDF cosine ranking over it.

pub mod builder;
pub mod quantizer;
pub mod searcher;
pub mod types;

pub use builder::AcousticIndexBuilder;
pub use quantizer::{FrameMatrix, Normalization, Quantizer};
pub use searcher::AcousticSearcher;
pub use types::{AcousticArtifacts, Histogram};
