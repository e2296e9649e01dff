use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::Semaphore;
use tokio::time::sleep;

use crate::config::FetchConfig;
use crate::error::{AppError, Result};
use crate::services::QuoteProvider;

use super::{FetchResult, Quote, Symbol};

/// Fixed-delay retry schedule: no growth, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub const fn immediate(max_attempts: u32) -> Self {
        Self::fixed(max_attempts, Duration::ZERO)
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::fixed(config.max_attempts, config.retry_delay())
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(5))
    }
}

/// Wraps single-symbol provider calls with a [`RetryPolicy`]. Failures are logged and
/// absorbed; callers only ever see a quote or nothing.
pub struct RetryingFetcher {
    provider: Arc<dyn QuoteProvider>,
    policy: RetryPolicy,
    upstream: Option<Arc<Semaphore>>,
}

impl RetryingFetcher {
    pub fn new(provider: Arc<dyn QuoteProvider>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            upstream: None,
        }
    }

    /// Share a permit pool with other fetchers so the total number of in-flight
    /// upstream calls stays bounded. Permits are held for the call only, never
    /// across the retry delay.
    pub fn with_upstream_limit(mut self, upstream: Arc<Semaphore>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn fetch(&self, symbol: &str) -> Option<Quote> {
        let max_attempts = self.policy.attempts();

        for attempt in 1..=max_attempts {
            match self.attempt(symbol).await {
                Ok(quote) => {
                    debug!("Fetched {symbol} on attempt {attempt}");
                    return Some(quote);
                }
                Err(err) => {
                    warn!("Error fetching {symbol} (attempt {attempt}/{max_attempts}): {err}");
                    if attempt < max_attempts && !self.policy.delay.is_zero() {
                        sleep(self.policy.delay).await;
                    }
                }
            }
        }

        None
    }

    pub async fn fetch_result(&self, symbol: Symbol) -> FetchResult {
        match self.fetch(&symbol).await {
            Some(quote) => FetchResult::Success(symbol, quote),
            None => FetchResult::Failed(symbol),
        }
    }

    async fn attempt(&self, symbol: &str) -> Result<Quote> {
        let _permit = match &self.upstream {
            Some(upstream) => Some(
                upstream
                    .acquire()
                    .await
                    .map_err(|_| AppError::message("upstream limiter closed"))?,
            ),
            None => None,
        };

        match self.provider.quote(symbol).await? {
            Some(quote) if !quote.is_empty() => Ok(quote),
            _ => Err(AppError::message("Empty quote")),
        }
    }
}
