use std::collections::{HashMap, HashSet};
use std::time::Instant;

use futures::stream::{self, StreamExt};
use log::{debug, info};

use super::{ensure_concurrency_limit, Quote, RetryingFetcher, Symbol, DISPATCH_WORKER_LIMIT};

/// Outcome of fetching a single symbol through the [`RetryingFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Success(Symbol, Quote),
    Failed(Symbol),
}

/// Result of one dispatch. Every selected symbol lands in exactly one of
/// `fetched` or `not_fetched`.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Requested symbols in request order, duplicates removed.
    pub selected: Vec<Symbol>,
    pub fetched: HashMap<Symbol, Quote>,
    pub not_fetched: HashSet<Symbol>,
    pub retry_passes: u32,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.not_fetched.is_empty()
    }

    /// Successful quotes in request order.
    pub fn fetched_in_order(&self) -> Vec<(&Symbol, &Quote)> {
        self.selected
            .iter()
            .filter_map(|symbol| self.fetched.get_key_value(symbol))
            .collect()
    }

    pub fn not_fetched_in_order(&self) -> Vec<&Symbol> {
        self.selected
            .iter()
            .filter(|symbol| self.not_fetched.contains(*symbol))
            .collect()
    }
}

/// Fans a batch out over the [`RetryingFetcher`] with a bounded worker count, then
/// gives the residual set a single extra round.
pub struct BatchDispatcher {
    fetcher: RetryingFetcher,
    worker_limit: usize,
    retry_residual: bool,
}

impl BatchDispatcher {
    pub fn new(fetcher: RetryingFetcher) -> Self {
        Self::with_worker_limit(fetcher, DISPATCH_WORKER_LIMIT)
    }

    pub fn with_worker_limit(fetcher: RetryingFetcher, worker_limit: usize) -> Self {
        Self {
            fetcher,
            worker_limit: ensure_concurrency_limit(worker_limit),
            retry_residual: true,
        }
    }

    pub fn retry_residual(mut self, enabled: bool) -> Self {
        self.retry_residual = enabled;
        self
    }

    pub fn worker_limit(&self) -> usize {
        self.worker_limit
    }

    pub async fn dispatch(&self, symbols: &[Symbol]) -> BatchOutcome {
        let started = Instant::now();

        let mut seen = HashSet::with_capacity(symbols.len());
        let selected: Vec<Symbol> = symbols
            .iter()
            .filter(|symbol| seen.insert(symbol.as_str()))
            .cloned()
            .collect();

        let mut fetched = HashMap::with_capacity(selected.len());
        self.run_round(&selected, &mut fetched).await;
        let mut not_fetched = residual(&selected, &fetched);

        let mut retry_passes = 0;
        if self.retry_residual && !not_fetched.is_empty() {
            retry_passes += 1;
            let pending: Vec<Symbol> = selected
                .iter()
                .filter(|symbol| not_fetched.contains(*symbol))
                .cloned()
                .collect();
            info!(
                "Retrying {} of {} symbols that failed the first round",
                pending.len(),
                selected.len()
            );
            self.run_round(&pending, &mut fetched).await;
            not_fetched = residual(&selected, &fetched);
        }

        info!(
            "Dispatched {} symbols: {} fetched, {} not fetched, {} retry pass(es) in {:.1?}",
            selected.len(),
            fetched.len(),
            not_fetched.len(),
            retry_passes,
            started.elapsed()
        );

        BatchOutcome {
            selected,
            fetched,
            not_fetched,
            retry_passes,
        }
    }

    async fn run_round(&self, symbols: &[Symbol], fetched: &mut HashMap<Symbol, Quote>) {
        let fetcher = &self.fetcher;

        // Results are folded here as they complete, so no collector lock is needed.
        let mut results = stream::iter(symbols.iter().cloned())
            .map(|symbol| async move { fetcher.fetch_result(symbol).await })
            .buffer_unordered(self.worker_limit);

        while let Some(result) = results.next().await {
            match result {
                FetchResult::Success(symbol, quote) => {
                    fetched.insert(symbol, quote);
                }
                FetchResult::Failed(symbol) => {
                    debug!("Gave up on {symbol} for this round");
                }
            }
        }
    }
}

fn residual(selected: &[Symbol], fetched: &HashMap<Symbol, Quote>) -> HashSet<Symbol> {
    selected
        .iter()
        .filter(|symbol| !fetched.contains_key(*symbol))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RetryPolicy;
    use crate::services::testing::ScriptedProvider;
    use std::sync::Arc;
    use std::time::Duration;

    fn symbols(names: &[&str]) -> Vec<Symbol> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn dispatcher(
        provider: &Arc<ScriptedProvider>,
        attempts: u32,
        workers: usize,
    ) -> BatchDispatcher {
        let fetcher = RetryingFetcher::new(provider.clone(), RetryPolicy::immediate(attempts));
        BatchDispatcher::with_worker_limit(fetcher, workers)
    }

    fn assert_partitioned(outcome: &BatchOutcome, universe: &[Symbol]) {
        let fetched: HashSet<&Symbol> = outcome.fetched.keys().collect();
        let missing: HashSet<&Symbol> = outcome.not_fetched.iter().collect();
        let expected: HashSet<&Symbol> = universe.iter().collect();

        assert!(fetched.is_disjoint(&missing));
        assert_eq!(fetched.union(&missing).copied().collect::<HashSet<_>>(), expected);
    }

    #[test]
    fn new_uses_default_worker_limit() {
        let provider = Arc::new(ScriptedProvider::new(["A"]));
        let dispatcher = BatchDispatcher::new(RetryingFetcher::new(provider, RetryPolicy::default()));
        assert_eq!(dispatcher.worker_limit(), DISPATCH_WORKER_LIMIT);
    }

    #[tokio::test]
    async fn every_symbol_lands_in_exactly_one_set() {
        let batch = symbols(&["RELIANCE", "TCS", "INFY", "HDFCBANK", "ITC"]);
        let provider = Arc::new(
            ScriptedProvider::new(batch.iter().map(String::as_str))
                .always_failing("TCS")
                .returning_empty("ITC")
                .failing_first("INFY", 1),
        );

        let outcome = dispatcher(&provider, 1, 3).dispatch(&batch).await;

        assert_partitioned(&outcome, &batch);
        assert_eq!(
            outcome.not_fetched,
            HashSet::from(["TCS".to_string(), "ITC".to_string()])
        );
        assert!(outcome.fetched.contains_key("INFY"));
        assert_eq!(outcome.retry_passes, 1);
    }

    #[tokio::test]
    async fn second_round_recovers_everything() {
        let batch = symbols(&["A", "B", "C", "D"]);
        let mut provider = ScriptedProvider::new(batch.iter().map(String::as_str));
        for symbol in &batch {
            provider = provider.failing_first(symbol, 3);
        }
        let provider = Arc::new(provider);

        let outcome = dispatcher(&provider, 3, 2).dispatch(&batch).await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.fetched.len(), batch.len());
        assert_eq!(outcome.retry_passes, 1);
        for symbol in &batch {
            assert_eq!(provider.calls(symbol), 4);
        }
    }

    #[tokio::test]
    async fn only_one_extra_round_is_run() {
        let batch = symbols(&["A", "B"]);
        let provider = Arc::new(
            ScriptedProvider::new(batch.iter().map(String::as_str)).always_failing("B"),
        );

        let outcome = dispatcher(&provider, 2, 4).dispatch(&batch).await;

        assert_eq!(outcome.retry_passes, 1);
        assert_eq!(provider.calls("A"), 1);
        assert_eq!(provider.calls("B"), 4);
        assert_eq!(outcome.not_fetched_in_order(), vec!["B"]);
    }

    #[tokio::test]
    async fn clean_batch_skips_the_retry_round() {
        let batch = symbols(&["A", "B", "C"]);
        let provider = Arc::new(ScriptedProvider::new(batch.iter().map(String::as_str)));

        let outcome = dispatcher(&provider, 3, 8).dispatch(&batch).await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.retry_passes, 0);
        assert_eq!(provider.total_calls(), 3);
    }

    #[tokio::test]
    async fn residual_retry_can_be_disabled() {
        let batch = symbols(&["A", "B"]);
        let provider = Arc::new(
            ScriptedProvider::new(batch.iter().map(String::as_str)).failing_first("B", 1),
        );

        let outcome = dispatcher(&provider, 1, 2)
            .retry_residual(false)
            .dispatch(&batch)
            .await;

        assert_eq!(outcome.retry_passes, 0);
        assert_eq!(outcome.not_fetched_in_order(), vec!["B"]);
    }

    #[tokio::test]
    async fn duplicate_symbols_are_fetched_once() {
        let batch = symbols(&["A", "B", "A"]);
        let provider = Arc::new(ScriptedProvider::new(["A", "B"]));

        let outcome = dispatcher(&provider, 1, 2).dispatch(&batch).await;

        assert_eq!(outcome.selected, symbols(&["A", "B"]));
        assert_eq!(provider.calls("A"), 1);
        let order: Vec<&str> = outcome
            .fetched_in_order()
            .into_iter()
            .map(|(symbol, _)| symbol.as_str())
            .collect();
        assert_eq!(order, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_outcome() {
        let provider = Arc::new(ScriptedProvider::new(Vec::<&str>::new()));

        let outcome = dispatcher(&provider, 3, 4).dispatch(&[]).await;

        assert!(outcome.is_complete());
        assert!(outcome.fetched.is_empty());
        assert_eq!(outcome.retry_passes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn worker_limit_bounds_concurrency() {
        let batch: Vec<Symbol> = (0..40).map(|i| format!("SYM{i}")).collect();
        let provider = Arc::new(
            ScriptedProvider::new(batch.iter().map(String::as_str))
                .with_latency(Duration::from_millis(20)),
        );

        let outcome = dispatcher(&provider, 1, 5).dispatch(&batch).await;

        assert!(outcome.is_complete());
        assert!(provider.max_in_flight() <= 5);
        assert!(provider.max_in_flight() > 1);
    }
}
