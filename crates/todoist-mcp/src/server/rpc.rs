//! JSON-RPC 2.0 envelope types and the MCP method dispatcher.
//!
//! Every outcome, including failures, is an HTTP 200 carrying a JSON-RPC
//! response; the `error` object is what signals failure.

use std::borrow::Cow;
use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use serde::Serialize;
use serde_json::{Value, json};

use super::transport::HttpState;
use crate::error::{RpcErrorCode, ToolError};
use crate::tools::{ToolContext, ToolRegistry};

/// MCP protocol revision announced by `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// Server name announced by `initialize`.
pub const SERVER_NAME: &str = "todoist-mcp";

/// A validated JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub id: Value,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    /// Validate a raw envelope.
    ///
    /// The `id` is echoed (or `null`) in the error when the envelope is not
    /// JSON-RPC 2.0. A missing method name is left empty and later answered
    /// as an unknown method.
    pub fn from_value(value: &Value) -> Result<Self, JsonRpcResponse> {
        let id = value.get("id").cloned().unwrap_or(Value::Null);

        if value.get("jsonrpc").and_then(Value::as_str) != Some(JsonRpcResponse::VERSION) {
            return Err(JsonRpcResponse::error(
                id,
                RpcErrorCode::InvalidRequest,
                "Invalid Request - expecting JSON-RPC 2.0",
            ));
        }

        let method = value.get("method").and_then(Value::as_str).unwrap_or_default();

        Ok(Self {
            method: method.to_string(),
            params: value.get("params").cloned().unwrap_or(Value::Null),
            id,
        })
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Map a tool failure onto the protocol's error shape.
    ///
    /// `upstream_message` is the message used when the backend answered with
    /// an error status; its body goes into `data`.
    #[must_use]
    pub fn from_tool_error(err: &ToolError, upstream_message: &str) -> Self {
        match err {
            ToolError::MissingParam { .. } => Self {
                code: RpcErrorCode::InvalidParams.code(),
                message: err.to_string(),
                data: None,
            },
            ToolError::Client(client) => match client.upstream_parts() {
                Some((_, body)) => Self {
                    code: RpcErrorCode::InternalError.code(),
                    message: upstream_message.to_string(),
                    data: Some(body.clone()),
                },
                None => Self::internal(client.to_string()),
            },
            ToolError::Serialization(e) => Self::internal(e.to_string()),
        }
    }

    fn internal(detail: String) -> Self {
        Self {
            code: RpcErrorCode::InternalError.code(),
            message: "Internal error".to_string(),
            data: Some(Value::String(detail)),
        }
    }
}

impl JsonRpcResponse {
    /// JSON-RPC version constant.
    pub const VERSION: &'static str = "2.0";

    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: Cow::Borrowed(Self::VERSION), id, result: Some(result), error: None }
    }

    #[must_use]
    pub fn error(id: Value, code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self::failure(id, JsonRpcError { code: code.code(), message: message.into(), data: None })
    }

    #[must_use]
    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self { jsonrpc: Cow::Borrowed(Self::VERSION), id, result: None, error: Some(error) }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Routes one JSON-RPC request to the MCP method handlers.
///
/// Holds no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct RpcDispatcher<'a> {
    tools: &'a ToolRegistry,
    ctx: &'a ToolContext,
}

impl<'a> RpcDispatcher<'a> {
    #[must_use]
    pub const fn new(tools: &'a ToolRegistry, ctx: &'a ToolContext) -> Self {
        Self { tools, ctx }
    }

    /// Handle a raw envelope.
    pub async fn dispatch(&self, envelope: &Value) -> JsonRpcResponse {
        match JsonRpcRequest::from_value(envelope) {
            Ok(request) => self.handle(request).await,
            Err(response) => response,
        }
    }

    /// Handle a validated request.
    pub async fn handle(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!(method = %req.method, "Handling JSON-RPC request");

        match req.method.as_str() {
            "initialize" => JsonRpcResponse::success(req.id, initialize_result()),
            "tools/list" => JsonRpcResponse::success(req.id, json!({ "tools": self.tools.all() })),
            "tools/call" => self.call_tool(req.id, &req.params).await,
            "ping" => JsonRpcResponse::success(req.id, json!({})),
            other => method_not_found(req.id, other),
        }
    }

    async fn call_tool(&self, id: Value, params: &Value) -> JsonRpcResponse {
        let name = params.get("name").and_then(Value::as_str).unwrap_or_default();

        let Some(tool) = self.tools.get(name) else {
            return method_not_found(id, name);
        };

        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        tracing::info!(tool = %name, "Executing tool");

        match tool.execute(self.ctx, arguments).await {
            Ok(content) => JsonRpcResponse::success(id, json!({ "content": content })),
            Err(e) => {
                tracing::error!(tool = %name, error = %e, "Tool execution failed");
                JsonRpcResponse::failure(
                    id,
                    JsonRpcError::from_tool_error(&e, tool.upstream_error_message()),
                )
            }
        }
    }
}

/// `-32601` naming the method or tool; an absent name reads as `undefined`.
fn method_not_found(id: Value, name: &str) -> JsonRpcResponse {
    let name = if name.is_empty() { "undefined" } else { name };
    JsonRpcResponse::error(id, RpcErrorCode::MethodNotFound, format!("Method not found: {name}"))
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// `POST /` — JSON-RPC entry point.
///
/// The body is read as JSON whatever its content type; anything unparseable
/// gets a `-32700` parse error, still with HTTP 200.
pub async fn handle_rpc(State(state): State<Arc<HttpState>>, body: Bytes) -> Json<JsonRpcResponse> {
    let response = match serde_json::from_slice::<Value>(&body) {
        Ok(envelope) => RpcDispatcher::new(&state.tools, &state.ctx).dispatch(&envelope).await,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable JSON-RPC body");
            JsonRpcResponse::error(Value::Null, RpcErrorCode::ParseError, format!("Parse error: {e}"))
        }
    };

    Json(response)
}
