//! TOML configuration parsing and validation.
//!
//! ```toml
//! [storage]
//! data_dir = "data/index"
//!
//! [fetch]
//! timeout_secs = 30
//!
//! [search]
//! snippet_length = 300
//!
//! [server]
//! bind = "127.0.0.1:7340"
//!
//! [sources.fastmcp]
//! repo = "jlowin/fastmcp"
//! branch = "main"
//! ```
//!
//! Every section is optional. A source names exactly one of `repo`
//! (GitHub `owner/name`), `url` (any ZIP URL), or `path` (a local ZIP).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ARCHIVE_EXTENSION: &str = ".zip";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Keyed by source name; iteration order is the ingestion order.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/index")
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            chunk_size: default_chunk_size(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_chunk_size() -> usize {
    8192
}
fn default_user_agent() -> String {
    format!("repo-index/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_snippet_length")]
    pub snippet_length: usize,
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            snippet_length: default_snippet_length(),
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
        }
    }
}

fn default_snippet_length() -> usize {
    300
}
fn default_top_k() -> usize {
    5
}
fn default_max_top_k() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// GitHub `owner/name`.
    #[serde(default)]
    pub repo: Option<String>,
    /// Explicit archive URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Local archive, used as-is (no download).
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_suffixes")]
    pub suffixes: Vec<String>,
    /// File name under `storage.data_dir`; defaults to `<source>.zip`.
    #[serde(default)]
    pub archive_name: Option<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_suffixes() -> Vec<String> {
    vec![".md".to_string(), ".mdx".to_string()]
}

/// Where a source's archive comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveLocation {
    Remote(String),
    Local(PathBuf),
}

impl SourceConfig {
    pub fn location(&self) -> Option<ArchiveLocation> {
        if let Some(path) = &self.path {
            return Some(ArchiveLocation::Local(path.clone()));
        }
        self.archive_url().map(ArchiveLocation::Remote)
    }

    /// `url` verbatim, or the GitHub branch archive URL for `repo`.
    pub fn archive_url(&self) -> Option<String> {
        match (&self.url, &self.repo) {
            (Some(url), _) => Some(url.clone()),
            (None, Some(repo)) => Some(format!(
                "https://github.com/{}/archive/refs/heads/{}.zip",
                repo.trim_matches('/'),
                self.branch
            )),
            (None, None) => None,
        }
    }

    pub fn archive_name(&self, source: &str) -> String {
        self.archive_name
            .clone()
            .unwrap_or_else(|| format!("{}{}", source, ARCHIVE_EXTENSION))
    }
}

impl Config {
    /// Defaults with no sources, for commands that can run without a file.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let mut config = parse_config(&content)?;

    // Relative local archives resolve against the config file's directory.
    if let Some(base) = path.parent() {
        for source in config.sources.values_mut() {
            if let Some(p) = &source.path {
                if p.is_relative() {
                    source.path = Some(base.join(p));
                }
            }
        }
    }

    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.search.snippet_length == 0 {
        bail!("search.snippet_length must be >= 1");
    }
    if config.search.default_top_k == 0 {
        bail!("search.default_top_k must be >= 1");
    }
    if config.search.max_top_k < config.search.default_top_k {
        bail!("search.max_top_k must be >= search.default_top_k");
    }
    if config.fetch.chunk_size == 0 {
        bail!("fetch.chunk_size must be >= 1");
    }

    for (name, source) in &config.sources {
        let origins = [
            source.repo.is_some(),
            source.url.is_some(),
            source.path.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if origins != 1 {
            bail!(
                "sources.{}: exactly one of repo, url, or path must be set",
                name
            );
        }
        if !source.archive_name(name).ends_with(ARCHIVE_EXTENSION) {
            bail!(
                "sources.{}: archive_name must end with {}",
                name,
                ARCHIVE_EXTENSION
            );
        }
        if source.suffixes.is_empty() || source.suffixes.iter().any(|s| s.is_empty()) {
            bail!("sources.{}: suffixes must be non-empty strings", name);
        }
    }

    Ok(config)
}
