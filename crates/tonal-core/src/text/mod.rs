//! Textual inverted index (C2, C3): SPIMI build over field-qualified
//! stems, TF-IDF cosine ranking at query time.

pub mod builder;
pub mod searcher;
pub mod types;

pub use builder::TextIndexBuilder;
pub use searcher::TextSearcher;
pub use types::{PostingMap, TextArtifacts};
