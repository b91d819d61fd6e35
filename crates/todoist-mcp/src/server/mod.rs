//! MCP server implementation.
//!
//! A single HTTP listener serves the JSON-RPC endpoint, the OAuth
//! authorization server, the SSE announcer and the plain tool routes.

pub mod oauth;
pub mod rpc;
pub mod sse;
pub mod transport;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::client::TodoistClient;
use crate::config::Config;
use crate::tools::ToolContext;
use oauth::OAuthStore;

/// MCP server for Todoist.
pub struct McpServer {
    /// Tool execution context.
    ctx: ToolContext,

    config: Config,

    oauth: OAuthStore,
}

impl McpServer {
    /// Create a new MCP server.
    #[must_use]
    pub fn new(client: TodoistClient, config: Config) -> Self {
        Self { ctx: ToolContext::new(Arc::new(client)), config, oauth: OAuthStore::new() }
    }

    /// Build the router without binding a socket.
    #[must_use]
    pub fn router(&self) -> axum::Router {
        transport::router_with_oauth(self.ctx.clone(), &self.config, self.oauth.clone())
    }

    /// Run the server until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be bound or the server fails.
    pub async fn run_http(self) -> anyhow::Result<()> {
        let port = self.config.port;
        tracing::info!(
            port,
            issuer_base = ?self.config.issuer_base,
            shared_secret = self.config.shared_secret.is_some(),
            "Starting MCP server in HTTP mode"
        );

        let cleanup = self.oauth.start_cleanup_task();
        let router = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        cleanup.abort();
        tracing::info!("HTTP server shut down");
        Ok(())
    }
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer").field("config", &self.config).finish_non_exhaustive()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
