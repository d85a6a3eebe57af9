//! CLI interface for metal-premium
//!
//! Provides subcommands for:
//! - `run`: Poll feeds on an interval and print each snapshot
//! - `once`: Run a single cycle
//! - `convert`: Value an amount of metal in a currency
//! - `serve`: Run the edge worker
//! - `config`: Show configuration

mod convert;
mod once;
pub mod render;
mod run;
mod serve;

pub use convert::ConvertArgs;
pub use once::OnceArgs;
pub use run::RunArgs;
pub use serve::ServeArgs;

use crate::config::Config;
use crate::feed::{HttpTransport, OfflineTransport, Transport};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "metal-premium")]
#[command(about = "Metal spot prices and regional premiums from public feeds")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll feeds on an interval
    Run(RunArgs),
    /// Run a single pipeline cycle
    Once(OnceArgs),
    /// Value an amount of metal
    Convert(ConvertArgs),
    /// Serve the worker document over HTTP
    Serve(ServeArgs),
    /// Show configuration
    Config,
}

/// Transport for feed requests; `offline` short-circuits every request
pub(crate) fn transport(config: &Config, offline: bool) -> anyhow::Result<Arc<dyn Transport>> {
    if offline {
        return Ok(Arc::new(OfflineTransport));
    }
    Ok(Arc::new(HttpTransport::new(
        Duration::from_secs(config.feeds.timeout_secs),
        &config.feeds.user_agent,
    )?))
}

/// Print the active configuration
pub fn print_config(config: &Config) {
    let url = |u: &Option<String>| u.clone().unwrap_or_else(|| "-".to_string());

    println!("Current configuration:");
    println!("  Spot JSON feed: {}", url(&config.feeds.spot_json_url));
    println!("  Delimited feed: {}", url(&config.feeds.delimited_url));
    println!("  Regional feed:  {}", url(&config.feeds.regional_url));
    println!("  Forex feed:     {}", url(&config.feeds.forex_url));
    println!(
        "  Metals: {}",
        config
            .pipeline
            .metals
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Currencies: {}", config.pipeline.currencies.join(", "));
    println!(
        "  Poll: every {}s, forex every {}s",
        config.pipeline.poll_interval_secs, config.pipeline.forex_refresh_secs
    );
    for rule in &config.pipeline.derivations {
        println!("  Derive {} = {} x {}", rule.metal, rule.ratio, rule.from);
    }
    for region in &config.regions {
        println!(
            "  Region {}: {} in {}, premium x{}, duty x{}",
            region.region,
            region.metal,
            region.currency,
            region.premium_multiplier,
            region.duty_multiplier
        );
    }
    println!(
        "  Worker: {} (cache {}s, max-age {}s)",
        config.worker.bind, config.worker.cache_ttl_secs, config.worker.max_age_secs
    );
}
