//! Data types that flow from the loader into the catalog and index.

use serde::Serialize;

/// A fully loaded archive member tagged with the source it came from.
///
/// `filename` is the member path with the archive's root directory
/// stripped, always `/`-separated. `content` is already UTF-8 (invalid
/// sequences were replaced during loading).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub source: String,
    pub filename: String,
    pub content: String,
}

impl Document {
    pub fn new(
        source: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// One ranked match returned by [`Index::search`](crate::Index::search).
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub source: String,
    pub filename: String,
    pub content: String,
    /// Relevance in `[0.0, 1.0]`; `0.0` for unranked (empty query) results.
    pub score: f64,
}
