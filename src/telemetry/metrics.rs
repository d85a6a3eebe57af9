//! Prometheus metrics

use crate::model::{Metal, Provenance, Region};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::time::Duration;

/// Outcome of a single upstream request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    NetworkFailure,
    ParseFailure,
}

impl FetchOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Success => "success",
            FetchOutcome::NetworkFailure => "network_failure",
            FetchOutcome::ParseFailure => "parse_failure",
        }
    }
}

/// Worker cache lookup result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

/// Install the Prometheus exporter on `0.0.0.0:port`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Count one upstream request
pub fn record_fetch(source: &'static str, outcome: FetchOutcome) {
    ::metrics::counter!(
        "metal_premium_feed_requests_total",
        "source" => source,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record the spot price published for a metal
pub fn record_quote(metal: Metal, price: Decimal, provenance: &Provenance) {
    ::metrics::gauge!("metal_premium_spot_usd", "metal" => metal.to_string())
        .set(price.to_f64().unwrap_or(0.0));

    if !provenance.is_live() {
        ::metrics::counter!(
            "metal_premium_fallbacks_total",
            "metal" => metal.to_string(),
            "kind" => provenance.label()
        )
        .increment(1);
    }
}

/// Record a regional premium percentage
pub fn record_premium(region: Region, percent: Decimal) {
    ::metrics::gauge!("metal_premium_premium_pct", "region" => region.to_string())
        .set(percent.to_f64().unwrap_or(0.0));
}

/// Record how long a full pipeline cycle took
pub fn record_cycle(duration: Duration) {
    ::metrics::histogram!("metal_premium_cycle_duration_ms").record(duration.as_secs_f64() * 1000.0);
}

/// Count a worker request by cache outcome
pub fn record_worker_request(outcome: CacheOutcome) {
    let cache = match outcome {
        CacheOutcome::Hit => "hit",
        CacheOutcome::Miss => "miss",
    };
    ::metrics::counter!("metal_premium_worker_requests_total", "cache" => cache).increment(1);
}
