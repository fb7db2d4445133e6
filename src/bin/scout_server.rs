//! HTTP server binary for scout.

use clap::Parser;
use scout::{SearchServer, ServiceConfig};
use scout_search::{ChromiumRenderer, SearchOrchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Scout: web search with headless-browser page scraping.
#[derive(Parser)]
#[command(name = "scout-server", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Chromium's CDP handler is chatty; keep it at warn unless RUST_LOG says otherwise.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("scout=info,scout_server=info,scout_search=info,chromiumoxide=warn")
        }))
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::load(cli.config.as_deref())?;
    info!(
        searxng = %config.search.resolver.searxng_url,
        deadline_secs = config.search.aggregator.deadline_seconds,
        "starting scout"
    );

    let renderer = ChromiumRenderer::new(config.browser.clone());
    let orchestrator = Arc::new(SearchOrchestrator::new(config.search.clone(), renderer)?);
    let server = SearchServer::start(Arc::clone(&orchestrator), &config.server).await?;
    info!(port = server.port(), "ready");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown();
    orchestrator.renderer().shutdown().await;
    Ok(())
}
