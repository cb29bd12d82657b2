//! HTTP transport.
//!
//! Serves the MCP streamable HTTP endpoint alongside a small JSON API for
//! clients that just want to call tools directly.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `*`    | `/mcp` | MCP streamable HTTP (JSON-RPC) |
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call a tool by name |
//! | `GET`  | `/health` | Status, version, and installed corpus tag |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "search: invalid argument: query must not be empty" } }
//! ```
//!
//! Codes: `bad_request` (400), `not_found` (404), `forbidden` (403),
//! `tool_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ToolError;
use crate::mcp::McpBridge;
use crate::traits::{ToolContext, ToolRegistry};

#[derive(Clone)]
struct AppState {
    tools: Arc<ToolRegistry>,
    ctx: ToolContext,
}

/// Build the router: REST routes plus the MCP service at `/mcp`.
pub fn router(tools: Arc<ToolRegistry>, ctx: ToolContext) -> Router {
    let bridge = McpBridge::new(tools.clone(), ctx.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .with_state(AppState { tools, ctx })
        .nest_service("/mcp", mcp_service)
        .layer(cors)
}

/// Serve until the process is terminated.
pub async fn run_http(bind: &str, port: u16, tools: Arc<ToolRegistry>, ctx: ToolContext) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind, port);
    let app = router(tools, ctx);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "HTTP server listening (MCP at /mcp)");
    axum::serve(listener, app).await?;
    Ok(())
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

fn classify_tool_error(tool_name: &str, err: ToolError) -> AppError {
    let (status, code) = match &err {
        ToolError::Validation(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        ToolError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        ToolError::PathViolation(_) => (StatusCode::FORBIDDEN, "forbidden"),
        ToolError::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, "tool_error"),
    };
    AppError {
        status,
        code,
        message: format!("{}: {}", tool_name, err),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    corpus_version: Option<String>,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        corpus_version: state.ctx.corpus().version(),
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

/// Returns `{ "result": "<text>" }` on success.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Option<Json<serde_json::Value>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let params = body.map(|Json(v)| v).unwrap_or(serde_json::Value::Null);
    let tools = state.tools.clone();
    let ctx = state.ctx.clone();
    let tool_name = name.clone();

    let outcome = tokio::task::spawn_blocking(move || tools.call(&tool_name, params, &ctx))
        .await
        .map_err(|e| classify_tool_error(&name, ToolError::Unexpected(e.to_string())))?;

    let text = outcome.map_err(|e| classify_tool_error(&name, e))?;
    Ok(Json(serde_json::json!({ "result": text })))
}
