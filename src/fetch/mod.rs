use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod dispatch;
pub mod partition;
pub mod retry;

pub use dispatch::{BatchDispatcher, BatchOutcome, FetchResult};
pub use partition::{batch_count, batch_size, partition, select_batch};
pub use retry::{RetryPolicy, RetryingFetcher};

/// Ticker identifier as listed by the exchange. Case-sensitive.
pub type Symbol = String;

/// Default concurrency guard applied to each dispatch round.
pub const DISPATCH_WORKER_LIMIT: usize = 30;

#[inline]
pub fn ensure_concurrency_limit(limit: usize) -> usize {
    limit.max(1)
}

/// Provider payload for one symbol. Passed through to clients untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quote(Value);

impl Quote {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// `null`, `{}`, `[]` and blank strings carry no quote data. Unlike Python
    /// truthiness, `0` and `false` count as data and whitespace-only text does not.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(text) => text.trim().is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }
}

impl From<Value> for Quote {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
