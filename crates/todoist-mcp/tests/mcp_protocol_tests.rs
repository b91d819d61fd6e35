//! JSON-RPC protocol tests through `POST /`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use todoist_mcp::client::TodoistClient;
use todoist_mcp::config::Config;
use todoist_mcp::server::transport::create_router;
use todoist_mcp::tools::ToolContext;

fn build_router(base_url: &str) -> axum::Router {
    let config = Config::for_testing(base_url);
    let client = TodoistClient::new(&config).unwrap();
    create_router(ToolContext::new(Arc::new(client)), &config)
}

/// Send a raw body to the JSON-RPC endpoint; the transport always answers 200.
async fn rpc_raw(app: axum::Router, body: String) -> Value {
    let response = app
        .oneshot(
            Request::post("/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn rpc(app: axum::Router, envelope: Value) -> Value {
    rpc_raw(app, envelope.to_string()).await
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_initialize() {
    let app = build_router("http://unused.localhost");
    let response = rpc(app, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})).await;

    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(response["result"]["capabilities"], json!({"tools": {}}));
    assert_eq!(response["result"]["serverInfo"]["name"], "todoist-mcp");
    assert!(response.get("error").is_none());
}

#[tokio::test]
async fn test_tools_list() {
    let app = build_router("http://unused.localhost");
    let response = rpc(app, json!({"jsonrpc": "2.0", "id": "list", "method": "tools/list"})).await;

    let tools = response["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0]["name"], "search");
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["query"]));
    assert_eq!(tools[1]["name"], "fetch");
    assert_eq!(tools[1]["inputSchema"]["required"], json!(["id"]));
}

#[tokio::test]
async fn test_ping() {
    let app = build_router("http://unused.localhost");
    let response = rpc(app, json!({"jsonrpc": "2.0", "id": 9, "method": "ping"})).await;
    assert_eq!(response["result"], json!({}));
}

// ─── Envelope errors ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_parse_error() {
    let app = build_router("http://unused.localhost");
    let response = rpc_raw(app, "{\"jsonrpc\": ".to_string()).await;

    assert_eq!(response["error"]["code"], -32700);
    assert!(response["id"].is_null());
}

#[tokio::test]
async fn test_wrong_version() {
    let app = build_router("http://unused.localhost");
    let response = rpc(app, json!({"jsonrpc": "1.0", "id": 3, "method": "tools/list"})).await;

    assert_eq!(response["error"]["code"], -32600);
    assert_eq!(response["error"]["message"], "Invalid Request - expecting JSON-RPC 2.0");
    assert_eq!(response["id"], 3);
    assert!(response.get("result").is_none());
}

#[tokio::test]
async fn test_unknown_method() {
    let app = build_router("http://unused.localhost");
    let response = rpc(app, json!({"jsonrpc": "2.0", "id": 4, "method": "resources/list"})).await;

    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(response["error"]["message"], "Method not found: resources/list");
}

// ─── tools/call ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_call_search() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v2/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "content": "buy milk"},
            {"id": 2, "content": "walk dog"}
        ])))
        .mount(&mock_server)
        .await;

    let app = build_router(&mock_server.uri());
    let response = rpc(
        app,
        json!({
            "jsonrpc": "2.0", "id": 5, "method": "tools/call",
            "params": {"name": "search", "arguments": {"query": "milk"}}
        }),
    )
    .await;

    assert_eq!(
        response["result"]["content"],
        json!([{
            "id": "1",
            "title": "buy milk",
            "text": "",
            "url": "https://todoist.com/showTask?id=1"
        }])
    );
}

#[tokio::test]
async fn test_call_search_without_query() {
    let app = build_router("http://unused.localhost");
    let response = rpc(
        app,
        json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {"name": "search"}}),
    )
    .await;

    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(response["error"]["message"], "Invalid params: query is required");
}

#[tokio::test]
async fn test_call_fetch_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v2/tasks/999"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "Task not found"})),
        )
        .mount(&mock_server)
        .await;

    let app = build_router(&mock_server.uri());
    let response = rpc(
        app,
        json!({
            "jsonrpc": "2.0", "id": 7, "method": "tools/call",
            "params": {"name": "fetch", "arguments": {"id": "999"}}
        }),
    )
    .await;

    assert_eq!(response["error"]["code"], -32603);
    assert_eq!(response["error"]["message"], "Todoist API error");
    assert_eq!(response["error"]["data"], json!({"error": "Task not found"}));
}

#[tokio::test]
async fn test_call_fetch_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v2/tasks/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "7", "content": "call mom", "project_id": "inbox"
        })))
        .mount(&mock_server)
        .await;

    let app = build_router(&mock_server.uri());
    let response = rpc(
        app,
        json!({
            "jsonrpc": "2.0", "id": 8, "method": "tools/call",
            "params": {"name": "fetch", "arguments": {"id": 7}}
        }),
    )
    .await;

    let content = &response["result"]["content"];
    assert_eq!(content["id"], "7");
    assert_eq!(content["title"], "call mom");
    assert_eq!(content["url"], "https://todoist.com/showTask?id=7");
    assert_eq!(content["metadata"], json!({"project_id": "inbox", "due": null}));
}

#[tokio::test]
async fn test_call_unknown_tool() {
    let app = build_router("http://unused.localhost");
    let response = rpc(
        app,
        json!({"jsonrpc": "2.0", "id": 10, "method": "tools/call", "params": {"name": "delete"}}),
    )
    .await;

    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(response["error"]["message"], "Method not found: delete");
}

#[tokio::test]
async fn test_call_without_name() {
    let app = build_router("http://unused.localhost");
    let response = rpc(
        app,
        json!({"jsonrpc": "2.0", "id": 11, "method": "tools/call", "params": {}}),
    )
    .await;

    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(response["error"]["message"], "Method not found: undefined");
    assert_eq!(response["id"], 11);
}

#[tokio::test]
async fn test_missing_method_is_method_not_found() {
    let app = build_router("http://unused.localhost");
    let response = rpc(app, json!({"jsonrpc": "2.0", "id": 12})).await;

    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(response["error"]["message"], "Method not found: undefined");
    assert_eq!(response["id"], 12);
}

#[tokio::test]
async fn test_call_search_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v2/tasks"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Forbidden"))
        .mount(&mock_server)
        .await;

    let app = build_router(&mock_server.uri());
    let response = rpc(
        app,
        json!({
            "jsonrpc": "2.0", "id": 13, "method": "tools/call",
            "params": {"name": "search", "arguments": {"query": "milk"}}
        }),
    )
    .await;

    assert_eq!(response["error"]["code"], -32603);
    assert_eq!(response["error"]["message"], "Internal error");
    assert_eq!(response["error"]["data"], "Forbidden");
}
