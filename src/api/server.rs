//! HTTP API Server
//!
//! Axum-based HTTP server for the scraper API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ScraperConfig;
use crate::search::SearchPipeline;

use super::handlers::AppState;
use super::routes::create_router;

/// HTTP API server
pub struct HttpServer {
    listen_addr: SocketAddr,
    state: AppState,
}

impl HttpServer {
    /// Create a server around an already built pipeline
    pub fn new(listen_addr: SocketAddr, state: AppState) -> Self {
        Self { listen_addr, state }
    }

    /// Create a server whose pipeline fetches over HTTP per `config`
    pub fn from_config(listen_addr: SocketAddr, config: &ScraperConfig) -> Result<Self> {
        let pipeline = SearchPipeline::from_config(config).context("Failed to build search pipeline")?;
        let state = AppState::new(Arc::new(pipeline));
        Ok(Self::new(listen_addr, state))
    }

    /// Run the HTTP server until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let app = create_router(self.state);

        let listener = TcpListener::bind(&self.listen_addr)
            .await
            .context("Failed to bind HTTP server")?;

        info!("HTTP API server listening on http://{}", self.listen_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("HTTP server shutting down");
            })
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}
