use std::net::SocketAddr;

use crate::error::{AppError, Result};

use super::{BatchingConfig, CalculatorConfig, Config, FetchConfig, ProviderConfig, ServerConfig};

/// Validate a loaded configuration and surface every problem in one error.
pub fn validate_config(config: &Config) -> Result<()> {
    let mut issues = Vec::new();

    validate_server(&config.server, &mut issues);
    validate_fetch(&config.fetch, &mut issues);
    validate_batching(&config.batching, &mut issues);
    validate_calculator(&config.calculator, &mut issues);
    validate_provider(&config.provider, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "config invalid:\n  - {}",
            issues.join("\n  - ")
        )))
    }
}

fn validate_server(server: &ServerConfig, issues: &mut Vec<String>) {
    if server.bind_addr.parse::<SocketAddr>().is_err() {
        issues.push(format!(
            "server.bind_addr `{}` is not a socket address",
            server.bind_addr
        ));
    }
}

fn validate_fetch(fetch: &FetchConfig, issues: &mut Vec<String>) {
    if fetch.max_attempts == 0 {
        issues.push("fetch.max_attempts must be at least 1".to_string());
    }
    if fetch.worker_limit == 0 {
        issues.push("fetch.worker_limit must be at least 1".to_string());
    }
    if fetch.upstream_limit == 0 {
        issues.push("fetch.upstream_limit must be at least 1".to_string());
    }
}

fn validate_batching(batching: &BatchingConfig, issues: &mut Vec<String>) {
    if batching.batch_count_target == 0 {
        issues.push("batching.batch_count_target must be at least 1".to_string());
    }
}

fn validate_calculator(calculator: &CalculatorConfig, issues: &mut Vec<String>) {
    if !calculator.capital.is_finite() || calculator.capital <= 0.0 {
        issues.push(format!(
            "calculator.capital must be a positive amount, got {}",
            calculator.capital
        ));
    }
}

fn validate_provider(provider: &ProviderConfig, issues: &mut Vec<String>) {
    for (field, value) in [
        ("provider.home_url", &provider.home_url),
        ("provider.stock_codes_url", &provider.stock_codes_url),
        ("provider.quote_url", &provider.quote_url),
    ] {
        if value.trim().is_empty() {
            issues.push(format!("{field} must not be empty"));
        } else if !value.starts_with("http://") && !value.starts_with("https://") {
            issues.push(format!("{field} `{value}` must be an http(s) URL"));
        }
    }

    if provider.timeout_secs == 0 {
        issues.push("provider.timeout_secs must be at least 1".to_string());
    }
}
