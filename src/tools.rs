//! Tool trait and registry for the tool-call layer.
//!
//! Every tool exposed over HTTP or MCP implements [`Tool`] and is looked up
//! by name in a [`ToolRegistry`]. The built-ins are:
//!
//! | Tool | Purpose |
//! |------|---------|
//! | `search_repo_index` | Ranked search, returns filename + snippet |
//! | `read_repo_file` | Full content of one file |
//! | `scrape` | Fetch a web page as text |
//!
//! Tool errors are `anyhow` errors wrapping a typed cause
//! ([`LookupError`], [`PipelineError`], [`IndexError`]) so transports can
//! map them to their own status codes by downcasting.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use repo_index_core::{IndexError, LookupError};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::PipelineError;
use crate::query::QueryService;
use crate::scrape;

#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores, used as the route / MCP name.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema object describing the parameters.
    fn parameters_schema(&self) -> Value;

    /// `params` is always a JSON object.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Shared state handed to every tool invocation.
#[derive(Clone)]
pub struct ToolContext {
    pub config: Arc<Config>,
    pub service: Arc<QueryService>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, service: Arc<QueryService>) -> Self {
        Self { config, service }
    }
}

fn invalid(message: impl Into<String>) -> anyhow::Error {
    PipelineError::InvalidArgument(message.into()).into()
}

/// Optional string parameter; `null` and absent are the same.
fn optional_str<'a>(params: &'a Value, key: &str) -> Result<Option<&'a str>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(invalid(format!("{} must be a string", key))),
    }
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    optional_str(params, key)?.ok_or_else(|| invalid(format!("{} is required", key)))
}

pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search_repo_index"
    }

    fn description(&self) -> &str {
        "Search the indexed repository documentation and return matching files with snippets"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Free-text search query" },
                "top_k": { "type": "integer", "description": "Maximum number of results", "default": 5, "minimum": 1 }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;

        let max = ctx.config.search.max_top_k;
        let top_k = match params.get("top_k") {
            None | Some(Value::Null) => None,
            Some(v) => match v.as_u64() {
                Some(k) if k >= 1 && k as usize <= max => Some(k as usize),
                _ => return Err(invalid(format!("top_k must be an integer in 1..={}", max))),
            },
        };

        let results = ctx.service.search(query, top_k)?;
        Ok(json!({ "results": results }))
    }
}

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_repo_file"
    }

    fn description(&self) -> &str {
        "Read the full content of an indexed file. Pass source when the filename exists in more than one repository"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": { "type": "string", "description": "Path inside the repository, e.g. docs/intro.md" },
                "source": { "type": ["string", "null"], "description": "Repository source name" }
            },
            "required": ["filename"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let filename = required_str(&params, "filename")?;
        if filename.trim().is_empty() {
            return Err(invalid("filename must not be empty"));
        }
        let source = optional_str(&params, "source")?;

        let content = ctx.service.read_file(filename, source)?;
        Ok(json!({ "filename": filename, "content": content }))
    }
}

pub struct ScrapeTool;

#[async_trait]
impl Tool for ScrapeTool {
    fn name(&self) -> &str {
        "scrape"
    }

    fn description(&self) -> &str {
        "Fetch a web page as plain text via Jina Reader"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "http(s) URL to fetch" }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let url = required_str(&params, "url")?.to_string();
        scrape::validate_url(&url)?;

        let timeout = ctx.config.fetch.timeout_secs;
        let text = tokio::task::spawn_blocking(move || scrape::fetch_page(&url, timeout)).await??;
        Ok(json!({ "text": text }))
    }
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// `search_repo_index`, `read_repo_file`, `scrape`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchTool));
        registry.register(Box::new(ReadFileTool));
        registry.register(Box::new(ScrapeTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse classification of a tool error, shared by the HTTP and MCP layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Ambiguous,
    BadRequest,
    Internal,
}

impl ErrorKind {
    pub fn of(err: &anyhow::Error) -> Self {
        if let Some(lookup) = err.downcast_ref::<LookupError>() {
            return match lookup {
                LookupError::NotFound { .. } => Self::NotFound,
                LookupError::Ambiguous { .. } => Self::Ambiguous,
            };
        }
        if err.downcast_ref::<IndexError>().is_some() {
            return Self::BadRequest;
        }
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::InvalidArgument(_)) => Self::BadRequest,
            _ => Self::Internal,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Ambiguous => "ambiguous",
            Self::BadRequest => "bad_request",
            Self::Internal => "tool_error",
        }
    }
}
