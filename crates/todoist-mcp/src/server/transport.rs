//! HTTP transport: router, shared state and the REST-style tool routes.
//!
//! Public routes (JSON-RPC, discovery, OAuth, health, SSE, flat tool routes)
//! sit beside a bearer-gated group under `/mcp`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::oauth::{OAuthStore, gate, handlers};
use super::rpc;
use super::sse::{self, ConnectionTracker};
use crate::config::Config;
use crate::error::ToolError;
use crate::models::{FetchInput, SearchInput};
use crate::tools::{FetchTool, SearchTool, ToolContext, ToolRegistry};

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub tools: ToolRegistry,
    pub ctx: ToolContext,
    pub oauth: OAuthStore,
    /// Public origin used in the discovery document.
    pub issuer_base: Option<String>,
    /// Extra secret required by the gated routes when set.
    pub shared_secret: Option<String>,
    pub ping_interval: Duration,
    pub sse: ConnectionTracker,
}

impl std::fmt::Debug for HttpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpState")
            .field("tools", &self.tools.len())
            .field("issuer_base", &self.issuer_base)
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "***"))
            .field("ping_interval", &self.ping_interval)
            .field("sse_active", &self.sse.active())
            .finish_non_exhaustive()
    }
}

/// Create the HTTP router with a fresh credential store.
pub fn create_router(ctx: ToolContext, config: &Config) -> Router {
    router_with_oauth(ctx, config, OAuthStore::new())
}

/// Create the HTTP router around an existing credential store.
pub fn router_with_oauth(ctx: ToolContext, config: &Config, oauth: OAuthStore) -> Router {
    let state = Arc::new(HttpState {
        tools: ToolRegistry::new(),
        ctx,
        oauth,
        issuer_base: config.issuer_base.clone(),
        shared_secret: config.shared_secret.clone(),
        ping_interval: config.sse_ping_interval,
        sse: ConnectionTracker::new(),
    });

    let protected = Router::new()
        .route("/mcp/search", post(handle_mcp_search))
        .route("/mcp/fetch", post(handle_mcp_fetch))
        .route_layer(middleware::from_fn_with_state(state.clone(), gate::require_bearer));

    Router::new()
        .route("/", get(root).post(rpc::handle_rpc))
        .route(
            "/.well-known/oauth-authorization-server",
            get(handlers::handle_auth_server_metadata),
        )
        .route("/oauth/authorize", get(handlers::handle_authorize))
        .route("/oauth/token", post(handlers::handle_token))
        .route("/healthz", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/sse", get(sse::handle_sse).post(sse::handle_sse))
        .route("/sse/", get(sse::handle_sse).post(sse::handle_sse))
        .route("/tools/search", post(handle_search))
        .route("/tools/fetch", post(handle_fetch))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(json!({ "status": "ok", "mcp": true }))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn readiness_check(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (auth_codes, access_tokens) = state.oauth.counts().await;
    Json(json!({
        "status": "ready",
        "service": "todoist-mcp",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.tools.len(),
        "sse_connections": state.sse.active(),
        "auth_codes": auth_codes,
        "access_tokens": access_tokens
    }))
}

/// Tool routes take any body; anything that is not a JSON object simply
/// carries no arguments.
fn lenient_args(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

async fn run_search(state: &HttpState, body: &Bytes) -> Result<Value, ToolError> {
    let input = SearchInput::from_args(&lenient_args(body));
    let hits = SearchTool::search(&state.ctx, input.require_query()?).await?;
    Ok(serde_json::to_value(hits)?)
}

async fn run_fetch(state: &HttpState, body: &Bytes) -> Result<Value, ToolError> {
    let input = FetchInput::from_args(&lenient_args(body));
    let document = FetchTool::fetch(&state.ctx, input.require_id()?).await?;
    Ok(serde_json::to_value(document)?)
}

/// `POST /tools/search` — `{"results": [...]}`.
async fn handle_search(
    State(state): State<Arc<HttpState>>,
    body: Bytes,
) -> Result<Json<Value>, ToolError> {
    let results = run_search(&state, &body).await?;
    Ok(Json(json!({ "results": results })))
}

/// `POST /tools/fetch` — `{"result": {...}}`.
async fn handle_fetch(
    State(state): State<Arc<HttpState>>,
    body: Bytes,
) -> Result<Json<Value>, ToolError> {
    let result = run_fetch(&state, &body).await?;
    Ok(Json(json!({ "result": result })))
}

/// `POST /mcp/search` — bare array of hits.
async fn handle_mcp_search(
    State(state): State<Arc<HttpState>>,
    body: Bytes,
) -> Result<Json<Value>, ToolError> {
    run_search(&state, &body).await.map(Json)
}

/// `POST /mcp/fetch` — bare task document.
async fn handle_mcp_fetch(
    State(state): State<Arc<HttpState>>,
    body: Bytes,
) -> Result<Json<Value>, ToolError> {
    run_fetch(&state, &body).await.map(Json)
}
