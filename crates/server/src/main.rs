//! medisw server entry point.
//!
//! Loads configuration, opens the cache database, starts the worker and
//! serves it over MCP on stdio. Logging goes to stderr to keep stdout free
//! for JSON-RPC.

use std::sync::Arc;

use anyhow::{Context, Result};
use medisw_client::{FetchClient, FetchConfig, Registration, ServiceWorker, WorkerConfig};
use medisw_core::{AppConfig, CacheDb};
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

    let config = AppConfig::load().context("loading configuration")?;
    let worker_config = WorkerConfig::from_app_config(&config)?;
    let cache = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
    let network = FetchClient::new(FetchConfig::from_app_config(&config)?)?;

    let worker = Arc::new(ServiceWorker::new(worker_config, cache, Arc::new(network)));
    tracing::info!(base_url = %config.base_url, cache = %worker.config().cache_name(), "starting medisw on stdio transport");

    // An unreachable backend must not keep the server from coming up; sw_register can retry.
    match worker.register().await {
        Ok(Registration::Started(report)) => {
            tracing::info!(cache = %report.install.cache_name, update = report.install.update, "worker registered")
        }
        Ok(Registration::Unregistered(report)) => {
            tracing::warn!(deleted = report.deleted.len(), "worker script missing, worker unregistered")
        }
        Ok(Registration::Offline) => tracing::info!("offline, serving from existing caches"),
        Err(e) => tracing::warn!("initial registration failed: {}", e),
    }

    let server = serve_server(handler::MediswServer::new(worker.clone()), stdio()).await?;
    server.waiting().await?;

    worker.settle().await;
    Ok(())
}
