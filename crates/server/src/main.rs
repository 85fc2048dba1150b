//! justsearch MCP server entry point.
//!
//! Boots the presentation host on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use justsearch_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let db = CacheDb::open(&config.db_path).await?;

    tracing::info!(db = %config.db_path.display(), offline = config.offline, "Starting justsearch server on stdio transport");

    let handler = handler::JustSearchServer::new(config, db)?;
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
