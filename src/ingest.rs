//! Ingestion orchestration.
//!
//! Sources are processed one at a time, in config order:
//! fetch → discover root → list members → load. A source's documents are
//! merged into the shared catalog only after all of them loaded, so a
//! failure part-way through one source never leaves it half-present. The
//! failure is recorded and the run continues with the next source.
//!
//! The index is built once, after every source has been processed, from
//! the catalog's final contents.
//!
//! Everything here blocks on network and disk I/O. Async callers should
//! run it via `tokio::task::spawn_blocking`.

use std::path::PathBuf;

use repo_index_core::{Catalog, Document, Index};
use serde::Serialize;
use tracing::{info, warn};

use crate::archive::Archive;
use crate::config::{ArchiveLocation, Config, SourceConfig};
use crate::error::{PipelineError, Result};
use crate::fetch::{ArchiveFetcher, HttpTransport, Transport};

/// Populated catalog and index, read-only from here on.
#[derive(Debug)]
pub struct Corpus {
    pub catalog: Catalog,
    pub index: Index,
}

impl Corpus {
    pub fn from_catalog(catalog: Catalog) -> Self {
        let index = Index::build(catalog.documents());
        Self { catalog, index }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub archive: PathBuf,
    /// `false` when the archive was already on disk (or configured as a local path).
    pub downloaded: bool,
    pub root: String,
    pub members: usize,
    pub documents: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub loaded: Vec<SourceReport>,
    pub failed: Vec<SourceFailure>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ingest every configured source over HTTP.
pub fn ingest_from_config(config: &Config) -> Result<(Corpus, IngestReport)> {
    let transport = HttpTransport::new(&config.fetch)?;
    Ok(ingest_sources(config, transport))
}

/// `rdx sync`: ingest and print per-source counts. Fails if any source did.
pub fn run_sync(config: &Config) -> anyhow::Result<()> {
    if config.sources.is_empty() {
        anyhow::bail!("no sources configured");
    }
    let (corpus, report) = ingest_from_config(config)?;

    for loaded in &report.loaded {
        println!(
            "{}: {} documents ({}, root {})",
            loaded.source,
            loaded.documents,
            if loaded.downloaded { "downloaded" } else { "cached" },
            loaded.root
        );
    }
    for failed in &report.failed {
        eprintln!("{}: FAILED: {}", failed.source, failed.error);
    }
    println!(
        "indexed {} documents from {} sources",
        corpus.index.len(),
        report.loaded.len()
    );

    if !report.is_clean() {
        anyhow::bail!("{} source(s) failed", report.failed.len());
    }
    Ok(())
}

pub fn ingest_sources<T: Transport>(config: &Config, transport: T) -> (Corpus, IngestReport) {
    let fetcher = ArchiveFetcher::new(transport, config.fetch.chunk_size);
    let mut catalog = Catalog::new();
    let mut report = IngestReport::default();

    for (name, source) in &config.sources {
        match ingest_source(config, &fetcher, name, source) {
            Ok((documents, source_report)) => {
                info!(
                    source = %name,
                    documents = source_report.documents,
                    root = %source_report.root,
                    "source loaded"
                );
                catalog.extend(documents);
                report.loaded.push(source_report);
            }
            Err(e) => {
                warn!(source = %name, error = %e, "source failed, skipping");
                report.failed.push(SourceFailure {
                    source: name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let corpus = Corpus::from_catalog(catalog);
    info!(
        documents = corpus.index.len(),
        sources = report.loaded.len(),
        failed = report.failed.len(),
        "index built"
    );
    (corpus, report)
}

fn ingest_source<T: Transport>(
    config: &Config,
    fetcher: &ArchiveFetcher<T>,
    name: &str,
    source: &SourceConfig,
) -> Result<(Vec<Document>, SourceReport)> {
    let (archive_path, downloaded) = match source.location() {
        Some(ArchiveLocation::Local(path)) => (path, false),
        Some(ArchiveLocation::Remote(url)) => {
            let (handle, downloaded) = fetcher.fetch_tracked(
                &url,
                &config.storage.data_dir,
                &source.archive_name(name),
            )?;
            (handle.local_path, downloaded)
        }
        None => {
            return Err(PipelineError::InvalidArgument(format!(
                "source '{}' has no repo, url, or path",
                name
            )))
        }
    };

    let mut archive = Archive::open(&archive_path)?;
    let root = archive.discover_root()?;
    let members = archive.list_members(&source.suffixes);
    let files = archive.load(&root, &members)?;
    if files.len() != members.len() {
        warn!(
            source = name,
            listed = members.len(),
            loaded = files.len(),
            "loader and inspector disagree on archive members"
        );
    }

    let documents: Vec<Document> = files
        .into_iter()
        .map(|f| Document::new(name, f.filename, f.content))
        .collect();

    let report = SourceReport {
        source: name.to_string(),
        archive: archive_path,
        downloaded,
        root,
        members: members.len(),
        documents: documents.len(),
    };
    Ok((documents, report))
}
