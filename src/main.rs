//! # Repo Index CLI (`rdx`)
//!
//! ## Usage
//!
//! ```bash
//! rdx --config ./config/rdx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rdx sources` | List configured sources and whether their archive is cached |
//! | `rdx sync` | Download and index every source, print per-source counts |
//! | `rdx search "<query>"` | Ranked search with snippets |
//! | `rdx read <filename>` | Print a file's full content |
//! | `rdx scrape <url>` | Print a web page as text |
//! | `rdx serve` | Start the HTTP/MCP tool server |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (e.g. `RUST_LOG=repo_index=debug`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use repo_index::{config, ingest, query, scrape, server, sources};

/// Repo Index: searchable documentation from repository archives.
#[derive(Parser)]
#[command(
    name = "rdx",
    about = "Download repository documentation archives, index them, and serve search to AI tools",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/rdx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured sources and whether their archive is on disk.
    Sources,

    /// Download (if needed) and index every source.
    ///
    /// Exits non-zero if any source failed; the others are still indexed.
    Sync,

    /// Search indexed documents.
    Search {
        query: String,

        /// Maximum number of results (defaults to `[search].default_top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Print the full content of one indexed file.
    ///
    /// Fails with the list of candidate sources if the filename exists in
    /// more than one source and `--source` is not given.
    Read {
        /// Path inside the repository, e.g. `docs/intro.md`.
        filename: String,

        #[arg(long)]
        source: Option<String>,
    },

    /// Fetch a web page as plain text through the reader service.
    Scrape { url: String },

    /// Start the HTTP tool server (REST + MCP) on `[server].bind`.
    Serve,
}

/// Run blocking pipeline work off the async runtime.
async fn blocking<F>(f: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // Scraping runs without a config file, but a broken one is still an error.
    let cfg = match cli.command {
        Commands::Scrape { .. } if !cli.config.exists() => config::Config::minimal(),
        _ => config::load_config(&cli.config)?,
    };

    match cli.command {
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Sync => {
            blocking(move || ingest::run_sync(&cfg)).await?;
        }
        Commands::Search { query, top_k } => {
            blocking(move || query::run_search(&cfg, &query, top_k)).await?;
        }
        Commands::Read { filename, source } => {
            blocking(move || query::run_read(&cfg, &filename, source.as_deref())).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Scrape { url } => {
            let timeout = cfg.fetch.timeout_secs;
            blocking(move || scrape::run_scrape(&url, timeout)).await?;
        }
    }

    Ok(())
}
