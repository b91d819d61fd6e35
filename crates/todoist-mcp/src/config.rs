//! Configuration for the Todoist MCP gateway.

use std::time::Duration;

/// Upstream API defaults.
pub mod api {
    use std::time::Duration;

    /// Todoist REST API base URL.
    pub const TODOIST_API: &str = "https://api.todoist.com/rest/v2";

    /// Todoist web app base URL, used to build task links.
    pub const TODOIST_WEB: &str = "https://todoist.com";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Retries for transient upstream failures.
    pub const MAX_RETRIES: u32 = 3;

    /// Maximum idle connections kept per host.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Idle connection expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Interval between SSE `ping` events.
pub const SSE_PING_INTERVAL: Duration = Duration::from_secs(15);

/// Server configuration.
#[derive(Clone)]
pub struct Config {
    /// Todoist API token used for every upstream call.
    pub todoist_token: Option<String>,

    /// Optional value required in the `x-mcp-secret` header on protected routes.
    pub shared_secret: Option<String>,

    /// OAuth issuer base URL, without trailing slash.
    pub issuer_base: Option<String>,

    /// HTTP listen port.
    pub port: u16,

    /// Base URL for the Todoist REST API (overridable for mock servers).
    pub api_base_url: String,

    /// Base URL for task links handed back to clients.
    pub web_base_url: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Retries for transient upstream failures.
    pub max_retries: u32,

    /// Interval between SSE keep-alive pings.
    pub sse_ping_interval: Duration,
}

impl Config {
    /// Create a new configuration with production defaults.
    #[must_use]
    pub fn new(
        todoist_token: Option<String>,
        shared_secret: Option<String>,
        issuer_base: Option<String>,
    ) -> Self {
        Self {
            todoist_token: non_empty(todoist_token),
            shared_secret: non_empty(shared_secret),
            issuer_base: normalize_issuer(issuer_base),
            port: DEFAULT_PORT,
            api_base_url: api::TODOIST_API.to_string(),
            web_base_url: api::TODOIST_WEB.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            max_retries: api::MAX_RETRIES,
            sse_ping_interval: SSE_PING_INTERVAL,
        }
    }

    /// Create a test configuration pointing at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            todoist_token: Some("test-todoist-token".to_string()),
            shared_secret: None,
            issuer_base: Some("https://mcp.example.com".to_string()),
            port: 0,
            api_base_url: format!("{}/rest/v2", base_url),
            web_base_url: "https://todoist.com".to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            max_retries: 0, // No retries in tests
            sse_ping_interval: SSE_PING_INTERVAL,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if `PORT` is set but not a valid port number.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::new(
            std::env::var("TODOIST_TOKEN").ok(),
            std::env::var("MCP_SHARED_SECRET").ok(),
            std::env::var("ISSUER_BASE").ok(),
        );

        if let Ok(port) = std::env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PORT {port:?}: {e}"))?;
        }
        if let Ok(url) = std::env::var("TODOIST_API_URL") {
            config.api_base_url = url;
        }
        if let Ok(url) = std::env::var("TODOIST_WEB_URL") {
            config.web_base_url = url;
        }

        Ok(config)
    }

    /// Builder-style setter for the shared secret.
    #[must_use]
    pub fn with_shared_secret(mut self, secret: impl Into<String>) -> Self {
        self.shared_secret = non_empty(Some(secret.into()));
        self
    }

    /// Builder-style setter for the issuer base.
    #[must_use]
    pub fn with_issuer_base(mut self, issuer: Option<String>) -> Self {
        self.issuer_base = normalize_issuer(issuer);
        self
    }

    /// Check if a Todoist token is configured.
    #[must_use]
    pub const fn has_todoist_token(&self) -> bool {
        self.todoist_token.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("has_todoist_token", &self.has_todoist_token())
            .field("has_shared_secret", &self.shared_secret.is_some())
            .field("issuer_base", &self.issuer_base)
            .field("port", &self.port)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn normalize_issuer(issuer: Option<String>) -> Option<String> {
    issuer
        .map(|s| s.trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.todoist_token.is_none());
        assert!(config.shared_secret.is_none());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.api_base_url, api::TODOIST_API);
    }

    #[test]
    fn test_issuer_trailing_slash_stripped() {
        let config = Config::new(None, None, Some("https://mcp.example.com/".into()));
        assert_eq!(config.issuer_base.as_deref(), Some("https://mcp.example.com"));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = Config::new(Some(String::new()), Some(String::new()), Some("/".into()));
        assert!(!config.has_todoist_token());
        assert!(config.shared_secret.is_none());
        assert!(config.issuer_base.is_none());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = Config::new(Some("tok".into()), Some("shh".into()), None);
        let debug = format!("{config:?}");
        assert!(!debug.contains("\"tok\""));
        assert!(!debug.contains("shh"));
    }
}
