//! sodalog-sw server entry point.
//!
//! Boots the offline cache router behind an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use sodalog_client::{FetchClient, FetchConfig};
use sodalog_core::{AppConfig, CacheDb, Registration, RouterConfig};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let app = AppConfig::load().context("loading configuration")?;
    tracing::info!(origin = %app.origin, db_path = %app.db_path.display(), "Starting sodalog-sw server on stdio transport");

    let cache = CacheDb::open(&app.db_path).await.context("opening cache database")?;
    let fetcher = FetchClient::new(FetchConfig::from_app(&app))?;
    let registration = Arc::new(Registration::new(Arc::new(fetcher), Arc::new(cache.clone())));

    // the deploy pipeline may pin a version; otherwise wait for sw_deploy
    if app.cache_name.is_some() {
        match RouterConfig::from_app(&app) {
            Ok(config) => match registration.register(config).await {
                Ok(outcome) => tracing::info!(?outcome, "registered configured version"),
                Err(e) => tracing::error!(error = %e, "initial install failed; serving without a router"),
            },
            Err(e) => tracing::error!(error = %e, "invalid router configuration"),
        }
    }

    let handler = handler::SodalogServer::new(app, cache, registration);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
