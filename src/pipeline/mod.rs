//! Price pipeline
//!
//! One parameterized pipeline: configured sources are queried one after
//! another, the normalizer resolves every enabled metal, and each configured
//! region gets a premium over its Western spot metal. A cycle takes the
//! previous snapshot and returns a new one; it never fails.

mod poller;
mod snapshot;

pub use poller::Poller;
pub use snapshot::{Snapshot, SnapshotStore};

use crate::config::{forex_max_age, Config, RegionConfig};
use crate::feed::{
    DelimitedFeed, ForexFeed, QuoteSource, RegionalFeed, SpotJsonFeed, Transport,
};
use crate::model::{ExchangeRateTable, FallbackReason, Metal, Provenance, Region};
use crate::normalize::{Normalizer, SourceAttempt};
use crate::premium::{PremiumCalculator, RegionalObservation};
use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Source of a forex refresh
const FOREX_SOURCE: &str = "forex";

/// The configured price pipeline
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    sources: Vec<Box<dyn QuoteSource>>,
    forex: Option<ForexFeed>,
    forex_max_age: Duration,
    normalizer: Normalizer,
    regions: Vec<PremiumCalculator>,
    metals: Vec<Metal>,
    currencies: Vec<String>,
}

impl Pipeline {
    /// Build a pipeline from configuration
    ///
    /// Sources are queried in the order spot JSON, delimited, regional.
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let mut sources: Vec<Box<dyn QuoteSource>> = Vec::new();
        if let Some(url) = &config.feeds.spot_json_url {
            sources.push(Box::new(SpotJsonFeed::new(url.clone())));
        }
        if let Some(url) = &config.feeds.delimited_url {
            sources.push(Box::new(DelimitedFeed::new(url.clone())));
        }
        if let Some(url) = &config.feeds.regional_url {
            sources.push(Box::new(RegionalFeed::new(url.clone())));
        }

        let normalizer = Normalizer::new(
            config.pipeline.range_factors.clone(),
            config.pipeline.derivations.clone(),
            config.fallback.clone(),
        );

        let regions: Vec<PremiumCalculator> = config
            .regions
            .iter()
            .cloned()
            .map(PremiumCalculator::new)
            .collect();

        let metals = required_metals(
            &config.pipeline.metals,
            &config.regions,
            &normalizer,
        );

        let mut currencies: Vec<String> = config
            .pipeline
            .currencies
            .iter()
            .chain(config.regions.iter().map(|r| &r.currency))
            .map(|c| c.to_uppercase())
            .collect();
        currencies.sort();
        currencies.dedup();

        Self {
            transport,
            sources,
            forex: config.feeds.forex_url.as_ref().map(ForexFeed::new),
            forex_max_age: forex_max_age(config.pipeline.forex_refresh_secs)
                .unwrap_or(Duration::MAX),
            normalizer,
            regions,
            metals,
            currencies,
        }
    }

    /// Metals resolved each cycle
    pub fn metals(&self) -> &[Metal] {
        &self.metals
    }

    /// Snapshot used before the first cycle completes: the static fallback set
    pub fn bootstrap(&self) -> Snapshot {
        let now = Utc::now();
        let quotes = self
            .normalizer
            .fallback_set(&self.metals, FallbackReason::NoSource);
        let rates = ExchangeRateTable::default();
        let unavailable = RegionalObservation::unavailable(FallbackReason::NoSource);

        let regions = self
            .regions
            .iter()
            .filter_map(|calc| {
                quotes
                    .get(&calc.config().metal)
                    .map(|spot| calc.calculate(spot, &unavailable, &rates, now))
            })
            .collect();

        Snapshot {
            cycle: 0,
            taken_at: now,
            quotes,
            regions,
            rates,
            rates_provenance: Provenance::Fallback {
                reason: FallbackReason::NoSource,
            },
        }
    }

    /// Run one full cycle
    pub async fn cycle(&self, previous: &Snapshot) -> Snapshot {
        let started = Instant::now();
        let taken_at = Utc::now();

        let mut attempts: BTreeMap<Metal, Vec<SourceAttempt>> = BTreeMap::new();
        let mut observations: BTreeMap<Region, RegionalObservation> = BTreeMap::new();

        for source in &self.sources {
            let name = source.name();
            match source.fetch(self.transport.as_ref()).await {
                Ok(batch) => {
                    for &metal in &self.metals {
                        let attempt = match batch.quotes.get(&metal) {
                            Some(raw) => Ok((raw.clone(), name)),
                            None => Err(FallbackReason::NoSource),
                        };
                        attempts.entry(metal).or_default().push(attempt);
                    }
                    for (region, observation) in batch.regional {
                        observations.entry(region).or_insert(observation);
                    }
                }
                Err(e) => {
                    for &metal in &self.metals {
                        attempts.entry(metal).or_default().push(Err(e.reason()));
                    }
                }
            }
        }

        let quotes = self.normalizer.resolve_all(&self.metals, &attempts);
        for (metal, quote) in &quotes {
            crate::telemetry::record_quote(*metal, quote.value.price, &quote.provenance);
        }

        let (rates, rates_provenance) = self.refresh_rates(previous, taken_at).await;

        let mut regions = Vec::with_capacity(self.regions.len());
        for calc in &self.regions {
            let region = calc.config().region;
            let Some(spot) = quotes.get(&calc.config().metal) else {
                continue;
            };
            let observation = observations
                .remove(&region)
                .unwrap_or_else(|| RegionalObservation::unavailable(FallbackReason::NoSource));

            let price = calc.calculate(spot, &observation, &rates, taken_at);
            crate::telemetry::record_premium(region, price.premium_percent);
            regions.push(price);
        }

        let elapsed = started.elapsed();
        crate::telemetry::record_cycle(elapsed);

        let snapshot = Snapshot {
            cycle: previous.cycle + 1,
            taken_at,
            quotes,
            regions,
            rates,
            rates_provenance,
        };

        tracing::info!(
            cycle = snapshot.cycle,
            elapsed_ms = elapsed.as_millis() as u64,
            live = snapshot.is_fully_live(),
            "Pipeline cycle complete"
        );

        snapshot
    }

    /// Carry the rate table forward, refreshing it when due
    ///
    /// A failed refresh keeps the previous table and its provenance.
    async fn refresh_rates(
        &self,
        previous: &Snapshot,
        now: chrono::DateTime<Utc>,
    ) -> (ExchangeRateTable, Provenance) {
        let mut rates = previous.rates.clone();

        let Some(forex) = &self.forex else {
            return (rates, previous.rates_provenance.clone());
        };

        if !rates.is_stale(now, self.forex_max_age) {
            return (rates, previous.rates_provenance.clone());
        }

        match forex.fetch(self.transport.as_ref()).await {
            Ok(fresh) => {
                let wanted = fresh
                    .into_iter()
                    .filter(|(code, _)| self.currencies.iter().any(|c| c == code));
                let applied = rates.merge(wanted, now);
                tracing::debug!(applied, "Exchange rates refreshed");
                if applied > 0 {
                    return (rates, Provenance::live(FOREX_SOURCE));
                }
                (rates, previous.rates_provenance.clone())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Keeping previous exchange rates");
                (rates, previous.rates_provenance.clone())
            }
        }
    }
}

/// Enabled metals plus every metal a region or derivation depends on
fn required_metals(
    enabled: &[Metal],
    regions: &[RegionConfig],
    normalizer: &Normalizer,
) -> Vec<Metal> {
    let mut metals: Vec<Metal> = enabled.to_vec();
    metals.extend(regions.iter().map(|r| r.metal));
    let derived_from: Vec<Metal> = metals
        .iter()
        .filter_map(|m| normalizer.derivation_for(*m).map(|r| r.from))
        .collect();
    metals.extend(derived_from);
    metals.sort();
    metals.dedup();
    metals
}
