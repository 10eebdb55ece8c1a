//! swcache server entry point.
//!
//! Boots the cache worker and serves its lifecycle, fetch and message entry
//! points as MCP tools on stdio transport. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig, Worker, WorkerConfig};
use swcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod handler;
mod host;
mod tools;

use host::HostClients;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let worker_config = WorkerConfig::from_app_config(&config)?;
    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = FetchClient::new(FetchConfig::from(&config))?;

    // The MCP session is the one client this host keeps open.
    let worker = Arc::new(Worker::new(worker_config, db, fetcher, HostClients::new(1)));

    tracing::info!(
        version = %config.version,
        scope = %config.scope,
        assets = config.assets.len(),
        "Starting swcache server on stdio transport"
    );

    let handler = handler::SwCacheServer::new(worker.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    worker.settle().await;

    Ok(())
}
