use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use stock_batch_server::config::{validator, Config};

#[derive(Parser)]
#[command(name = "stock-batch-server")]
#[command(about = "HTTP service serving batched NSE quotes and risk/reward levels")]
#[command(version)]
pub struct Cli {
    /// JSON config file; built-in defaults are used when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// Address to listen on, overriding the config file
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl Cli {
    /// Config file (or built-in defaults) with command-line overrides applied.
    /// The final result is validated whichever flags were given.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = match self.config.as_deref() {
            Some(path) => Config::load(path).context("Failed to load configuration")?,
            None => Config::builtin(),
        };
        if let Some(bind) = &self.bind {
            config.server.bind_addr = bind.clone();
        }
        validator::validate_config(&config).context("Invalid configuration")?;
        Ok(config)
    }
}

pub fn log_banner(config: &Config) {
    info!("# ------------------------------------------------------------------ #");
    info!("# Stock batch server");
    info!("#   listen:        {}", config.server.bind_addr);
    info!(
        "#   retries:       {} attempts, {}s apart",
        config.fetch.max_attempts, config.fetch.retry_delay_secs
    );
    info!(
        "#   workers:       {} per batch, {} upstream",
        config.fetch.worker_limit, config.fetch.upstream_limit
    );
    info!("#   batch target:  {}", config.batching.batch_count_target);
    info!("# ------------------------------------------------------------------ #");
}
