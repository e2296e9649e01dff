//! HTTP request handlers.

use axum::extract::{Query, State};
use axum::Json;
use log::debug;

use crate::calculator::calculate;
use crate::error::{AppError, Result};
use crate::fetch::{batch_count, batch_size, select_batch};
use crate::utils::kolkata_timestamp;

use super::types::{
    BatchQuery, CalculateQuery, LevelsResponse, StatusMessage, StockCodesResponse,
    StocksDataResponse,
};
use super::AppState;

/// GET / - Liveness message.
pub async fn home() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "📈 Stock server is running!",
    })
}

/// GET /get_all_stock_codes - The symbol universe and how it is batched.
pub async fn get_all_stock_codes(
    State(state): State<AppState>,
) -> Result<Json<StockCodesResponse>> {
    let symbols = state.universe.symbols().await?;
    let target = state.batching.batch_count_target;

    Ok(Json(StockCodesResponse {
        total_stock_codes: symbols.len(),
        stock_codes: symbols.to_vec(),
        batch_size: batch_size(symbols.len(), target),
        batch_count: batch_count(symbols.len(), target),
    }))
}

/// GET /get_stocks_data?batch_num=N - Fetch every quote in batch N.
pub async fn get_stocks_data(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<StocksDataResponse>> {
    let batch_num = query
        .batch_num
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::invalid("Please provide a valid 'batch_num' in query params"))?;

    let symbols = state.universe.symbols().await?;
    let batch = select_batch(&symbols, state.batching.batch_count_target, batch_num)?;
    debug!("Dispatching batch {batch_num} with {} symbols", batch.len());

    let outcome = state.dispatcher.dispatch(&batch).await;
    Ok(Json(StocksDataResponse::from_outcome(
        kolkata_timestamp(),
        outcome,
    )))
}

/// GET /calculate?open=&prior_high=&prior_low=[&capital=] - Risk/reward levels.
pub async fn calculate_levels(
    State(state): State<AppState>,
    Query(query): Query<CalculateQuery>,
) -> Result<Json<LevelsResponse>> {
    let open = parse_number("open", query.open.as_deref())?;
    let prior_high = parse_number("prior_high", query.prior_high.as_deref())?;
    let prior_low = parse_number("prior_low", query.prior_low.as_deref())?;
    let capital = match query.capital.as_deref() {
        Some(raw) => parse_number("capital", Some(raw))?,
        None => state.calculator.capital,
    };
    if capital <= 0.0 {
        return Err(AppError::invalid("'capital' must be a positive amount"));
    }

    let levels = calculate(open, prior_high, prior_low, capital);
    Ok(Json(LevelsResponse::from(levels)))
}

fn parse_number(name: &str, raw: Option<&str>) -> Result<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            AppError::invalid(format!("Please provide a numeric '{name}' in query params"))
        })
}
