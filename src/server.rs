//! HTTP tool server.
//!
//! Ingests every configured source once at startup, then serves the
//! resulting index read-only.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call a registered tool by name |
//! | `*`    | `/mcp` | MCP Streamable HTTP endpoint over the same tools |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "ambiguous", "message": "filename 'readme.md' exists in multiple sources: repoA, repoB; pass a source to disambiguate" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `ambiguous` (409),
//! `tool_error` (500).

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::ingest::ingest_from_config;
use crate::mcp::McpBridge;
use crate::query::QueryService;
use crate::tools::{ErrorKind, ToolContext, ToolRegistry};

#[derive(Clone)]
struct AppState {
    ctx: ToolContext,
    tools: Arc<ToolRegistry>,
}

/// Ingest, bind to `[server].bind`, and serve until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let config = Arc::new(config.clone());

    let ingest_config = config.clone();
    let (corpus, report) = tokio::task::spawn_blocking(move || ingest_from_config(&ingest_config))
        .await
        .context("ingestion task panicked")??;
    for failure in &report.failed {
        warn!(source = %failure.source, error = %failure.error, "source unavailable");
    }

    let service = Arc::new(QueryService::new(corpus, &config.search));
    let ctx = ToolContext::new(config.clone(), service);
    let app = router(ctx, Arc::new(ToolRegistry::with_builtins()));

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!(addr = %bind_addr, "tool server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// All routes, with CORS open to any origin.
pub fn router(ctx: ToolContext, tools: Arc<ToolRegistry>) -> Router {
    let bridge = McpBridge::new(ctx.clone(), tools.clone());
    let mcp = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .nest_service("/mcp", mcp)
        .layer(cors)
        .with_state(AppState { ctx, tools })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: ErrorKind::NotFound.code(),
        message: message.into(),
    }
}

fn classify_tool_error(err: anyhow::Error) -> AppError {
    let kind = ErrorKind::of(&err);
    let status = match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Ambiguous => StatusCode::CONFLICT,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    AppError {
        status,
        code: kind.code(),
        message: err.to_string(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    documents: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: state.ctx.service.corpus().index.len(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            parameters: t.parameters_schema(),
        })
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let params = match params {
        serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        other => other,
    };

    let result = tool
        .execute(params, &state.ctx)
        .await
        .map_err(classify_tool_error)?;

    Ok(Json(serde_json::json!({ "result": result })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Corpus;
    use repo_index_core::Catalog;
    use serde_json::json;

    fn state() -> AppState {
        let mut catalog = Catalog::new();
        catalog.put("repoA", "readme.md", "Alpha readme");
        catalog.put("repoA", "guide/setup.md", "How to setup the project");
        catalog.put("repoB", "readme.md", "Beta readme");
        let config = Config::minimal();
        let service = QueryService::new(Corpus::from_catalog(catalog), &config.search);
        AppState {
            ctx: ToolContext::new(Arc::new(config), Arc::new(service)),
            tools: Arc::new(ToolRegistry::with_builtins()),
        }
    }

    async fn call(name: &str, params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        handle_tool_call(State(state()), Path(name.to_string()), Json(params))
            .await
            .map(|Json(v)| v)
    }

    #[tokio::test]
    async fn test_health_counts_documents() {
        let Json(health) = handle_health(State(state())).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.documents, 3);
    }

    #[tokio::test]
    async fn test_list_tools() {
        let Json(list) = handle_list_tools(State(state())).await;
        let names: Vec<&str> = list.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["search_repo_index", "read_repo_file", "scrape"]);
    }

    #[tokio::test]
    async fn test_search_call() {
        let body = call("search_repo_index", json!({ "query": "setup", "top_k": 2 }))
            .await
            .unwrap();
        assert_eq!(body["result"]["results"][0]["filename"], "guide/setup.md");
    }

    #[tokio::test]
    async fn test_ambiguous_read_is_conflict() {
        let err = call("read_repo_file", json!({ "filename": "readme.md" }))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "ambiguous");
        assert!(err.message.contains("repoA, repoB"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = call("read_repo_file", json!({ "filename": "nope.md", "source": "repoA" }))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_top_k_is_bad_request() {
        let err = call("search_repo_index", json!({ "query": "x", "top_k": 0 }))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = call("add", json!({ "a": 1, "b": 2 })).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
