//! Todoist MCP Gateway - Entry Point

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use todoist_mcp::{TodoistClient, config::Config, server::McpServer};

#[derive(Parser, Debug)]
#[command(name = "todoist-mcp")]
#[command(about = "MCP gateway for Todoist tasks")]
#[command(version)]
struct Cli {
    /// Todoist API token used for every upstream call
    #[arg(long, env = "TODOIST_TOKEN", hide_env_values = true)]
    todoist_token: Option<String>,

    /// Extra secret required in `x-mcp-secret` on the protected routes
    #[arg(long, env = "MCP_SHARED_SECRET", hide_env_values = true)]
    shared_secret: Option<String>,

    /// Public origin advertised in the OAuth discovery document
    #[arg(long, env = "ISSUER_BASE")]
    issuer_base: Option<String>,

    /// HTTP server port
    #[arg(long, default_value_t = todoist_mcp::config::DEFAULT_PORT, env = "PORT")]
    port: u16,

    /// Todoist REST API base URL
    #[arg(long, env = "TODOIST_API_URL")]
    api_url: Option<String>,

    /// Todoist web base URL used in task links
    #[arg(long, env = "TODOIST_WEB_URL")]
    web_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Todoist MCP gateway");

    let mut config = Config::new(cli.todoist_token, cli.shared_secret, cli.issuer_base);
    config.port = cli.port;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(url) = cli.web_url {
        config.web_base_url = url;
    }

    if !config.has_todoist_token() {
        tracing::warn!("TODOIST_TOKEN is not set; upstream requests will be rejected");
    }
    if config.issuer_base.is_none() {
        tracing::warn!("ISSUER_BASE is not set; OAuth discovery will fail");
    }

    let client = TodoistClient::new(&config)?;
    McpServer::new(client, config).run_http().await
}
