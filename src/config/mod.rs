use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, Context, Result};

pub mod validator;

/// Default number of batches the symbol universe is split into.
pub const DEFAULT_BATCH_COUNT_TARGET: usize = 100;
/// Capital used by the risk/reward calculator when a request does not name one.
pub const DEFAULT_CAPITAL: f64 = 100_000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Retry and fan-out knobs for the batch dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    /// Concurrent fetches per dispatch round.
    pub worker_limit: usize,
    /// Upstream calls in flight across every request served by the process.
    pub upstream_limit: usize,
    /// Run one extra round over symbols that failed the first round.
    pub retry_residual: bool,
}

impl FetchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_secs: 5,
            worker_limit: 30,
            upstream_limit: 60,
            retry_residual: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    pub batch_count_target: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            batch_count_target: DEFAULT_BATCH_COUNT_TARGET,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    pub capital: f64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            capital: DEFAULT_CAPITAL,
        }
    }
}

/// Endpoints and headers for the NSE quote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Visited once to obtain the session cookies the API insists on.
    pub home_url: String,
    pub stock_codes_url: String,
    pub quote_url: String,
    pub headers: HashMap<String, String>,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let headers = HashMap::from([
            (
                "User-Agent".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            ),
            (
                "Accept-Language".to_string(),
                "en-US,en;q=0.9".to_string(),
            ),
            (
                "Referer".to_string(),
                "https://www.nseindia.com/get-quotes/equity".to_string(),
            ),
        ]);

        Self {
            home_url: "https://www.nseindia.com".to_string(),
            stock_codes_url: "https://archives.nseindia.com/content/equities/EQUITY_L.csv"
                .to_string(),
            quote_url: "https://www.nseindia.com/api/quote-equity".to_string(),
            headers,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub batching: BatchingConfig,
    pub calculator: CalculatorConfig,
    pub provider: ProviderConfig,
}

impl Config {
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load a JSON config, falling back through the executable's directory and the
    /// working directory. Missing sections keep their built-in values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let search_paths = vec![
            path.to_path_buf(),
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|p| p.join(path)))
                .unwrap_or_else(|| path.to_path_buf()),
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf()),
        ];

        let mut last_error = None;

        for search_path in search_paths {
            match std::fs::read_to_string(&search_path) {
                Ok(content) => {
                    let config = Self::from_json(&content).with_context(|| {
                        format!("failed to parse config JSON at {}", search_path.display())
                    })?;
                    log::info!("Loaded configuration from {}", search_path.display());
                    return Ok(config);
                }
                Err(e) => {
                    last_error = Some(format!("Failed to read {}: {}", search_path.display(), e));
                }
            }
        }

        Err(AppError::message(format!(
            "Could not find config file. Last error: {}",
            last_error.unwrap_or_else(|| "No search paths".to_string())
        )))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        validator::validate_config(&config)?;
        Ok(config)
    }
}
