mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use cli::Cli;
use stock_batch_server::server::{self, AppState};
use stock_batch_server::services::{NseProvider, QuoteProvider};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = cli.resolve_config()?;
    cli::log_banner(&config);

    let provider: Arc<dyn QuoteProvider> = Arc::new(
        NseProvider::new(config.provider.clone()).context("Failed to build quote provider")?,
    );
    let state = AppState::from_config(&config, provider);

    // The listing is retried on first request if it is unavailable now.
    match state.universe.symbols().await {
        Ok(symbols) => info!("Ready with {} stock codes", symbols.len()),
        Err(err) => warn!("Stock codes unavailable at startup: {err}"),
    }

    server::serve(&config.server.bind_addr, state).await?;
    Ok(())
}
