//! Todoist REST API client.
//!
//! Provides async HTTP client with:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff
//! - Bearer authentication with the configured Todoist token

use std::time::Duration;

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use url::Url;

use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};
use crate::models::{Task, TaskId};

/// Todoist REST API client.
#[derive(Clone)]
pub struct TodoistClient {
    /// HTTP client with middleware.
    client: ClientWithMiddleware,

    /// API token (optional; requests go out unauthenticated without it).
    token: Option<String>,

    /// REST API base URL.
    api_base_url: Url,

    /// Web app base URL for task links.
    web_base_url: Url,
}

impl TodoistClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a base URL is invalid or HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_secs(1), Duration::from_secs(30))
            .build_with_max_retries(config.max_retries);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            token: config.todoist_token.clone(),
            api_base_url: Url::parse(&config.api_base_url)?,
            web_base_url: Url::parse(&config.web_base_url)?,
        })
    }

    /// Check if a token is configured.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// List every active task.
    ///
    /// A successful response that is not a JSON array yields no tasks, and
    /// entries that are not task objects are skipped.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or non-2xx status.
    pub async fn list_tasks(&self) -> ClientResult<Vec<Task>> {
        let url = self.endpoint(&["tasks"])?;

        let serde_json::Value::Array(entries) = self.get(url).await? else {
            return Ok(Vec::new());
        };

        let total = entries.len();
        let tasks: Vec<Task> =
            entries.into_iter().filter_map(|entry| serde_json::from_value(entry).ok()).collect();

        if tasks.len() < total {
            tracing::warn!(skipped = total - tasks.len(), "Skipped malformed task entries");
        }
        Ok(tasks)
    }

    /// Get a single task by ID.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or non-2xx status; the upstream
    /// body is preserved in [`ClientError::Upstream`].
    pub async fn get_task(&self, id: &TaskId) -> ClientResult<Task> {
        let url = self.endpoint(&["tasks", id.as_str()])?;
        let value = self.get(url).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Link to a task in the Todoist web app.
    #[must_use]
    pub fn task_url(&self, id: &TaskId) -> String {
        let mut url = self.web_base_url.clone();
        url.set_path("showTask");
        url.query_pairs_mut().clear().append_pair("id", id.as_str());
        url.to_string()
    }

    /// Build an API URL below the base path, escaping each segment.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make an authenticated GET request.
    async fn get(&self, url: Url) -> ClientResult<serde_json::Value> {
        tracing::debug!(url = %url, "Todoist API request");

        let mut request = self.client.get(url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let response = Self::handle_response(response).await?;
        Ok(response.json().await?)
    }

    /// Turn non-success statuses into [`ClientError::Upstream`].
    async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Todoist API returned an error");
        Err(ClientError::upstream(status.as_u16(), &text))
    }
}

impl std::fmt::Debug for TodoistClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoistClient")
            .field("has_token", &self.has_token())
            .field("api_base_url", &self.api_base_url.as_str())
            .finish()
    }
}
