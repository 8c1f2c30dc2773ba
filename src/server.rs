//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Both entry points open the graph through [`MemoryEngine::open`] and hand a
//! clone of it to each [`HippoTools`] instance.

use crate::tools::HippoTools;
use anyhow::{Context, Result};
use hippograph::config::HippoConfig;
use hippograph::engine::MemoryEngine;
use rmcp::ServiceExt;

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: HippoConfig) -> Result<()> {
    tracing::info!("starting hippograph MCP server on stdio");

    let engine = MemoryEngine::open(config)?;

    let tools = HippoTools::new(engine);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: HippoConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!(addr = %bind_addr, "starting hippograph MCP server on HTTP");

    let engine = MemoryEngine::open(config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(HippoTools::new(engine.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
