use thiserror::Error;

/// Failure to resolve a catalog entry.
///
/// Both variants are per-request outcomes and are meant to be surfaced to
/// the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("file not found: {}", display_key(.source_name.as_deref(), .filename))]
    NotFound {
        source_name: Option<String>,
        filename: String,
    },

    #[error(
        "filename '{filename}' exists in multiple sources: {}; pass a source to disambiguate",
        .sources.join(", ")
    )]
    Ambiguous {
        filename: String,
        /// Sorted, deduplicated.
        sources: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("top_k must be >= 1")]
    InvalidTopK,
}

fn display_key(source: Option<&str>, filename: &str) -> String {
    match source {
        Some(source) => format!("{}:{}", source, filename),
        None => filename.to_string(),
    }
}
