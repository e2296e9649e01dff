use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use log::{info, warn};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::config::{BatchingConfig, CalculatorConfig, Config};
use crate::error::{Context, Result};
use crate::fetch::{ensure_concurrency_limit, BatchDispatcher, RetryPolicy, RetryingFetcher};
use crate::services::{QuoteProvider, SymbolUniverse};

pub mod handlers;
pub mod types;

/// Application state shared across handlers. Holds no per-request fetch state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<BatchDispatcher>,
    pub universe: Arc<SymbolUniverse>,
    pub batching: BatchingConfig,
    pub calculator: CalculatorConfig,
}

impl AppState {
    pub fn from_config(config: &Config, provider: Arc<dyn QuoteProvider>) -> Self {
        let upstream = Arc::new(Semaphore::new(ensure_concurrency_limit(
            config.fetch.upstream_limit,
        )));
        let fetcher = RetryingFetcher::new(
            Arc::clone(&provider),
            RetryPolicy::from_config(&config.fetch),
        )
        .with_upstream_limit(upstream);
        let dispatcher = BatchDispatcher::with_worker_limit(fetcher, config.fetch.worker_limit)
            .retry_residual(config.fetch.retry_residual);

        Self {
            dispatcher: Arc::new(dispatcher),
            universe: Arc::new(SymbolUniverse::new(provider)),
            batching: config.batching.clone(),
            calculator: config.calculator.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/get_all_stock_codes", get(handlers::get_all_stock_codes))
        .route("/get_stocks_data", get(handlers::get_stocks_data))
        .route("/calculate", get(handlers::calculate_levels))
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("Stock server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Stock server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
