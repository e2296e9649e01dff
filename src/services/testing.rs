use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::fetch::{Quote, Symbol};

use super::QuoteProvider;

/// In-memory provider with per-symbol failure scripts and call accounting.
pub struct ScriptedProvider {
    codes: Vec<Symbol>,
    failures_before_success: HashMap<Symbol, usize>,
    always_failing: HashSet<Symbol>,
    empty: HashSet<Symbol>,
    code_failures: AtomicUsize,
    latency: Option<Duration>,
    calls: Mutex<HashMap<Symbol, usize>>,
    code_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new<'a>(codes: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            codes: codes.into_iter().map(str::to_string).collect(),
            failures_before_success: HashMap::new(),
            always_failing: HashSet::new(),
            empty: HashSet::new(),
            code_failures: AtomicUsize::new(0),
            latency: None,
            calls: Mutex::new(HashMap::new()),
            code_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing_first(mut self, symbol: &str, failures: usize) -> Self {
        self.failures_before_success
            .insert(symbol.to_string(), failures);
        self
    }

    pub fn always_failing(mut self, symbol: &str) -> Self {
        self.always_failing.insert(symbol.to_string());
        self
    }

    pub fn returning_empty(mut self, symbol: &str) -> Self {
        self.empty.insert(symbol.to_string());
        self
    }

    /// Fail the first `failures` symbol listing calls.
    pub fn failing_codes(self, failures: usize) -> Self {
        self.code_failures.store(failures, Ordering::SeqCst);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn quote_for(symbol: &str) -> Quote {
        Quote::new(json!({
            "info": { "symbol": symbol },
            "priceInfo": { "open": 100.0, "lastPrice": 101.25 }
        }))
    }

    pub fn calls(&self, symbol: &str) -> usize {
        self.calls.lock().unwrap().get(symbol).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn code_calls(&self) -> usize {
        self.code_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for ScriptedProvider {
    async fn stock_codes(&self) -> Result<Vec<Symbol>> {
        self.code_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.code_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.code_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::message("listing endpoint unreachable"));
        }
        Ok(self.codes.clone())
    }

    async fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(symbol.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.always_failing.contains(symbol) {
            return Err(AppError::message(format!("{symbol} is unavailable")));
        }
        if self.empty.contains(symbol) {
            return Ok(Some(Quote::new(json!({}))));
        }
        let failures = self
            .failures_before_success
            .get(symbol)
            .copied()
            .unwrap_or(0);
        if call <= failures {
            return Err(AppError::message(format!(
                "{symbol} failed on call {call}"
            )));
        }
        if !self.codes.iter().any(|code| code == symbol) {
            return Ok(None);
        }
        Ok(Some(Self::quote_for(symbol)))
    }
}
