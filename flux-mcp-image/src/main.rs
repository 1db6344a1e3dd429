//! Flux MCP Image Server
//!
//! MCP server for image generation using Black Forest Labs Flux models.

use anyhow::Result;
use clap::Parser;
use flux_mcp_common::tracing::init_tracing;
use flux_mcp_common::{Config, McpServerBuilder, TransportArgs};
use flux_mcp_image::FluxServer;

/// Command-line arguments for the Flux server.
#[derive(Parser, Debug)]
#[command(name = "flux-mcp-image")]
#[command(about = "MCP server for image generation using Black Forest Labs Flux")]
struct Args {
    /// Transport configuration
    #[command(flatten)]
    transport: TransportArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the stdio protocol, so logs go to stderr
    init_tracing("info");

    tracing::info!("flux-mcp-image server starting...");

    let args = Args::parse();

    let config = Config::from_env()?;
    tracing::info!(
        api_base_url = %config.api_base_url,
        api_key_set = config.api_key.is_some(),
        poll_timeout_secs = config.poll_timeout_secs,
        "Configuration loaded"
    );
    if config.api_key.is_none() {
        tracing::warn!("BFL_API_KEY is not set; generation requests will fail until it is");
    }

    let server = FluxServer::new(config)?;

    let transport = args.transport.into_transport();

    McpServerBuilder::new(server)
        .with_transport(transport)
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
