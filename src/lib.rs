//! # Repo Index
//!
//! Download documentation archives of source repositories, index their
//! Markdown files in memory, and serve ranked search and whole-file reads
//! to AI tools.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌──────────┐   ┌──────────────┐
//! │  Fetcher  │──▶│ Inspector │──▶│  Loader  │──▶│ Catalog+Index│
//! │ (ZIP/HTTP)│   │  (root)   │   │ (UTF-8)  │   │  (in memory) │
//! └───────────┘   └───────────┘   └──────────┘   └──────┬───────┘
//!                                                       │
//!                                  ┌────────────────────┤
//!                                  ▼                    ▼
//!                             ┌──────────┐        ┌──────────┐
//!                             │   CLI    │        │   HTTP   │
//!                             │  (rdx)   │        │  (MCP)   │
//!                             └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rdx sources                      # configured sources
//! rdx sync                         # download + index, print counts
//! rdx search "getting started"
//! rdx read docs/intro.md --source fastmcp
//! rdx serve                        # start HTTP/MCP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Pipeline error type |
//! | [`fetch`] | Archive download with a pluggable transport |
//! | [`archive`] | Root discovery, member listing, document loading |
//! | [`ingest`] | Per-source pipeline orchestration |
//! | [`query`] | Search / read façade |
//! | [`scrape`] | Web page text via a reader service |
//! | [`tools`] | Tool trait and registry |
//! | [`mcp`] | MCP bridge over the tool registry |
//! | [`server`] | HTTP tool server |
//! | [`sources`] | Source status listing |
//!
//! Catalog, index, and document types live in `repo-index-core`.

pub mod archive;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod mcp;
pub mod query;
pub mod scrape;
pub mod server;
pub mod sources;
pub mod tools;
