//! Tests for configuration and the Todoist client.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use todoist_mcp::ClientError;
use todoist_mcp::client::TodoistClient;
use todoist_mcp::config::{Config, DEFAULT_PORT, SSE_PING_INTERVAL, api};
use todoist_mcp::models::TaskId;

// ─── Config ──────────────────────────────────────────────────────────────────

#[test]
fn test_production_defaults() {
    let config = Config::new(Some("tok".into()), None, None);
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.api_base_url, "https://api.todoist.com/rest/v2");
    assert_eq!(config.web_base_url, "https://todoist.com");
    assert_eq!(config.max_retries, api::MAX_RETRIES);
    assert_eq!(config.sse_ping_interval, SSE_PING_INTERVAL);
    assert!(config.has_todoist_token());
}

#[test]
fn test_for_testing_points_at_mock() {
    let config = Config::for_testing("http://127.0.0.1:9999");
    assert_eq!(config.api_base_url, "http://127.0.0.1:9999/rest/v2");
    assert_eq!(config.max_retries, 0);
    assert!(config.issuer_base.is_some());
}

#[test]
fn test_builders() {
    let config = Config::default()
        .with_shared_secret("s3cret")
        .with_issuer_base(Some("https://gw.example/".into()));
    assert_eq!(config.shared_secret.as_deref(), Some("s3cret"));
    assert_eq!(config.issuer_base.as_deref(), Some("https://gw.example"));

    let config = config.with_shared_secret("");
    assert!(config.shared_secret.is_none());
}

#[test]
fn test_invalid_base_url_rejected() {
    let mut config = Config::default();
    config.api_base_url = "not a url".into();
    assert!(TodoistClient::new(&config).is_err());
}

// ─── Client ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_tasks_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v2/tasks"))
        .and(header("authorization", "Bearer test-todoist-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "content": "a"},
            {"id": 2, "content": "b", "description": "two"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = TodoistClient::new(&Config::for_testing(&mock_server.uri())).unwrap();
    let tasks = client.list_tasks().await.unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1].id.as_str(), "2");
    assert_eq!(tasks[1].text(), "two");
}

#[tokio::test]
async fn test_get_task_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v2/tasks/77"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .mount(&mock_server)
        .await;

    let client = TodoistClient::new(&Config::for_testing(&mock_server.uri())).unwrap();
    let err = client.get_task(&TaskId::new("77")).await.unwrap_err();

    match err {
        ClientError::Upstream { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, json!({"error": "boom"}));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
    let client = TodoistClient::new(&Config::for_testing("http://127.0.0.1:1")).unwrap();
    let err = client.list_tasks().await.unwrap_err();
    assert!(err.upstream_parts().is_none());
}

#[test]
fn test_task_url_uses_web_base() {
    let mut config = Config::for_testing("http://unused.localhost");
    config.web_base_url = "https://app.todoist.example".into();
    let client = TodoistClient::new(&config).unwrap();
    assert_eq!(client.task_url(&TaskId::new("abc")), "https://app.todoist.example/showTask?id=abc");
}
