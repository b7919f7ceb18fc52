//! Query service: the search/read façade over an ingested [`Corpus`].
//!
//! This is the only surface the tool layer talks to. It holds the corpus
//! read-only, so one instance can be shared behind an `Arc` across
//! request handlers without locking.

use repo_index_core::{IndexError, LookupError};
use serde::Serialize;

use tracing::warn;

use crate::config::{Config, SearchConfig};
use crate::ingest::{ingest_from_config, Corpus};

/// One `search_repo_index` result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSnippet {
    pub filename: String,
    pub source: String,
    pub score: f64,
    /// The first `snippet_length` characters of the document.
    pub snippet: String,
}

pub struct QueryService {
    corpus: Corpus,
    snippet_length: usize,
    default_top_k: usize,
}

impl QueryService {
    pub fn new(corpus: Corpus, config: &SearchConfig) -> Self {
        Self {
            corpus,
            snippet_length: config.snippet_length,
            default_top_k: config.default_top_k,
        }
    }

    /// Ingest every configured source and wrap the result. Blocking.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let (corpus, report) = ingest_from_config(config)?;
        for failed in &report.failed {
            warn!(source = %failed.source, error = %failed.error, "source unavailable");
        }
        Ok(Self::new(corpus, &config.search))
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Ranked search; `top_k` defaults to the configured value.
    pub fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<SearchSnippet>, IndexError> {
        let hits = self
            .corpus
            .index
            .search(query, top_k.unwrap_or(self.default_top_k))?;
        Ok(hits
            .into_iter()
            .map(|hit| SearchSnippet {
                snippet: truncate_chars(&hit.content, self.snippet_length),
                filename: hit.filename,
                source: hit.source,
                score: hit.score,
            })
            .collect())
    }

    /// Full content of a file. Without `source`, the filename must be
    /// unique across all sources.
    pub fn read_file(&self, filename: &str, source: Option<&str>) -> Result<String, LookupError> {
        self.corpus
            .catalog
            .resolve(filename, source)
            .map(str::to_string)
    }
}

/// `rdx search`: ingest, search, print ranked snippets.
pub fn run_search(config: &Config, query: &str, top_k: Option<usize>) -> anyhow::Result<()> {
    if let Some(k) = top_k {
        if k == 0 || k > config.search.max_top_k {
            anyhow::bail!("--top-k must be in 1..={}", config.search.max_top_k);
        }
    }
    let service = QueryService::from_config(config)?;
    let results = service.search(query, top_k)?;
    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, r) in results.iter().enumerate() {
        println!("{}. [{:.2}] {} / {}", i + 1, r.score, r.source, r.filename);
        println!("    snippet: \"{}\"", r.snippet.replace('\n', " ").trim());
        println!();
    }
    Ok(())
}

/// `rdx read`: ingest, print one file's full content.
pub fn run_read(config: &Config, filename: &str, source: Option<&str>) -> anyhow::Result<()> {
    let service = QueryService::from_config(config)?;
    let content = service.read_file(filename, source)?;
    println!("{}", content);
    Ok(())
}

/// Hard cut after `max` characters, no word-boundary adjustment.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
