use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;

use crate::config::ProviderConfig;
use crate::error::{AppError, Context, Result};
use crate::fetch::{Quote, Symbol};

use super::QuoteProvider;

/// Header row label of the equity listing archive.
const LISTING_HEADER: &str = "SYMBOL";

/// NSE quote API client. The API rejects requests without the cookies set by the
/// public site, so the session is primed lazily and re-primed after a rejection.
/// Concurrent first callers wait on `priming` so only one of them visits the site.
pub struct NseProvider {
    client: Client,
    config: ProviderConfig,
    session_primed: AtomicBool,
    priming: Mutex<()>,
}

impl NseProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .default_headers(build_headers(&config.headers)?)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            session_primed: AtomicBool::new(false),
            priming: Mutex::new(()),
        })
    }

    async fn ensure_session(&self) -> Result<()> {
        if self.session_primed.load(Ordering::Acquire) {
            return Ok(());
        }

        let _guard = self.priming.lock().await;
        if self.session_primed.load(Ordering::Acquire) {
            return Ok(());
        }

        let response = self
            .client
            .get(&self.config.home_url)
            .send()
            .await
            .with_context(|| format!("Failed to open session at {}", self.config.home_url))?;

        if !response.status().is_success() {
            return Err(AppError::message(format!(
                "Session request to {} failed with status {}",
                self.config.home_url,
                response.status()
            )));
        }

        debug!("Primed NSE session cookies");
        self.session_primed.store(true, Ordering::Release);
        Ok(())
    }
}

#[async_trait]
impl QuoteProvider for NseProvider {
    async fn stock_codes(&self) -> Result<Vec<Symbol>> {
        let response = self
            .client
            .get(&self.config.stock_codes_url)
            .send()
            .await
            .map_err(|err| AppError::provider(format!("Failed to request stock codes: {err}")))?;

        if !response.status().is_success() {
            return Err(AppError::provider(format!(
                "Stock code listing request failed with status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| AppError::provider(format!("Failed to read stock codes: {err}")))?;

        let codes = parse_stock_codes(&body)?;
        if codes.is_empty() {
            return Err(AppError::provider("Stock code listing contained no symbols"));
        }

        info!("Loaded {} stock codes from {}", codes.len(), self.config.stock_codes_url);
        Ok(codes)
    }

    async fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        self.ensure_session().await?;

        let response = self
            .client
            .get(&self.config.quote_url)
            .query(&[("symbol", symbol)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.session_primed.store(false, Ordering::Release);
            return Err(AppError::message(format!(
                "Quote request for {symbol} was rejected with status {status}"
            )));
        }

        if !status.is_success() {
            return Err(AppError::message(format!(
                "Quote request for {symbol} failed with status {status}"
            )));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse quote payload for {symbol}"))?;
        Ok(Some(Quote::new(value)))
    }
}

/// Extract the first column of the equity listing CSV, skipping the header,
/// blanks and repeats.
pub fn parse_stock_codes(body: &str) -> Result<Vec<Symbol>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut seen = HashSet::new();
    let mut codes = Vec::new();

    for record in reader.records() {
        let record = record?;
        let Some(code) = record.get(0).map(str::trim) else {
            continue;
        };
        if code.is_empty() || code == LISTING_HEADER {
            continue;
        }
        if seen.insert(code.to_string()) {
            codes.push(code.to_string());
        }
    }

    Ok(codes)
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .with_context(|| format!("Invalid header name: {}", key))?;
        let header_value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid header value for {}", key))?;
        map.insert(name, header_value);
    }
    Ok(map)
}
