use std::sync::Arc;

use log::info;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::fetch::Symbol;

use super::QuoteProvider;

/// Load-once cache of the provider's symbol listing. A failed or empty load leaves
/// the cache unset so the next caller tries again.
pub struct SymbolUniverse {
    provider: Arc<dyn QuoteProvider>,
    symbols: RwLock<Option<Arc<Vec<Symbol>>>>,
}

impl SymbolUniverse {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self {
            provider,
            symbols: RwLock::new(None),
        }
    }

    pub async fn symbols(&self) -> Result<Arc<Vec<Symbol>>> {
        if let Some(symbols) = self.symbols.read().await.as_ref() {
            return Ok(Arc::clone(symbols));
        }

        let mut guard = self.symbols.write().await;
        if let Some(symbols) = guard.as_ref() {
            return Ok(Arc::clone(symbols));
        }

        let codes = self.provider.stock_codes().await.map_err(|err| match err {
            AppError::ProviderUnavailable(_) => err,
            other => AppError::provider(other.to_string()),
        })?;
        if codes.is_empty() {
            return Err(AppError::provider("Provider returned no stock codes"));
        }

        info!("Symbol universe loaded with {} symbols", codes.len());
        let codes = Arc::new(codes);
        *guard = Some(Arc::clone(&codes));
        Ok(codes)
    }
}
