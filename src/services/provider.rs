use async_trait::async_trait;

use crate::error::Result;
use crate::fetch::{Quote, Symbol};

/// Market-data source consumed by the fetch pipeline.
///
/// `quote` may answer `Ok(None)` or an empty payload for symbols it has nothing on;
/// callers treat both the same as an error.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Full listing of tradeable symbols, in the provider's order.
    async fn stock_codes(&self) -> Result<Vec<Symbol>>;

    async fn quote(&self, symbol: &str) -> Result<Option<Quote>>;
}
