//! Todoist MCP Gateway
//!
//! A Model Context Protocol (MCP) gateway that lets a tool-calling agent
//! search and fetch Todoist tasks. Protected routes sit behind a minimal
//! OAuth 2.0 authorization-code flow and an optional shared-secret header.
//!
//! # Features
//!
//! - **JSON-RPC dispatcher**: `initialize`, `tools/list`, `tools/call`
//! - **OAuth**: one-time authorization codes, short-lived bearer tokens
//! - **SSE announcer**: tool catalog push with periodic keep-alive pings
//! - **Flat routes**: plain JSON tool endpoints, public and bearer-protected
//!
//! # Example
//!
//! ```no_run
//! use todoist_mcp::{client::TodoistClient, config::Config, server::McpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = TodoistClient::new(&config)?;
//!     McpServer::new(client, config).run_http().await
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod tools;

pub use client::TodoistClient;
pub use config::Config;
pub use error::{AuthError, ClientError, ToolError};
