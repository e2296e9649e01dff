//! JSON shapes served by the HTTP surface.

use serde::{Deserialize, Serialize};

use crate::calculator::LevelSet;
use crate::fetch::{BatchOutcome, Quote, Symbol};

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StockCodesResponse {
    pub total_stock_codes: usize,
    pub stock_codes: Vec<Symbol>,
    pub batch_size: usize,
    pub batch_count: usize,
}

/// Query string of `/get_stocks_data`. Kept as text so a malformed number is
/// reported the same way as a missing one.
#[derive(Debug, Default, Deserialize)]
pub struct BatchQuery {
    pub batch_num: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StockEntry {
    #[serde(rename = "STOCK_SYMBOL")]
    pub symbol: Symbol,
    #[serde(rename = "STOCK_DATA")]
    pub data: Quote,
}

#[derive(Debug, Serialize)]
pub struct StocksDataResponse {
    pub timestamp: String,
    pub stocks: Vec<StockEntry>,
    /// The requested batch, or `null` once every symbol in it was fetched.
    pub selected_stock: Option<Vec<Symbol>>,
    pub not_fetched_lst: Vec<Symbol>,
    pub fetched_stock: Vec<Symbol>,
    pub fetching_count: u32,
}

impl StocksDataResponse {
    pub fn from_outcome(timestamp: String, outcome: BatchOutcome) -> Self {
        let stocks: Vec<StockEntry> = outcome
            .fetched_in_order()
            .into_iter()
            .map(|(symbol, quote)| StockEntry {
                symbol: symbol.clone(),
                data: quote.clone(),
            })
            .collect();
        let fetched_stock = stocks.iter().map(|entry| entry.symbol.clone()).collect();
        let not_fetched_lst = outcome
            .not_fetched_in_order()
            .into_iter()
            .cloned()
            .collect();
        let selected_stock = if outcome.is_complete() {
            None
        } else {
            Some(outcome.selected)
        };

        Self {
            timestamp,
            stocks,
            selected_stock,
            not_fetched_lst,
            fetched_stock,
            fetching_count: outcome.retry_passes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CalculateQuery {
    pub open: Option<String>,
    pub prior_high: Option<String>,
    pub prior_low: Option<String>,
    pub capital: Option<String>,
}

/// Calculator output plus the signal placeholders downstream sheets expect.
#[derive(Debug, Serialize)]
pub struct LevelsResponse {
    #[serde(flatten)]
    pub levels: LevelSet,
    #[serde(rename = "Signal")]
    pub signal: Option<String>,
    #[serde(rename = "Current_price")]
    pub current_price: Option<f64>,
    #[serde(rename = "Signal_Flag")]
    pub signal_flag: Option<bool>,
}

impl From<LevelSet> for LevelsResponse {
    fn from(levels: LevelSet) -> Self {
        Self {
            levels,
            signal: None,
            current_price: None,
            signal_flag: None,
        }
    }
}
