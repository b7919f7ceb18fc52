//! Errors raised by the ingestion pipeline (fetch, inspect, load).
//!
//! Any of these aborts the ingestion of the one source that raised it;
//! [`ingest`](crate::ingest) records the failure and moves on.
//! Catalog lookups use [`LookupError`](repo_index_core::LookupError)
//! instead, since those are per-request outcomes.

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("archive {} has no entries", .0.display())]
    EmptyArchive(PathBuf),

    #[error(
        "archive {} must contain exactly one top-level directory, found: {}",
        .path.display(),
        .roots.iter().cloned().collect::<Vec<_>>().join(", ")
    )]
    AmbiguousRoot {
        path: PathBuf,
        roots: BTreeSet<String>,
    },

    #[error("failed to read archive {}: {message}", .path.display())]
    Archive { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn network(url: &str, message: impl ToString) -> Self {
        Self::Network {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn archive(path: &std::path::Path, err: impl ToString) -> Self {
        Self::Archive {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
