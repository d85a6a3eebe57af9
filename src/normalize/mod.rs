//! Quote normalization
//!
//! Turns raw, possibly partial feed quotes into complete [`Quote`]s:
//!
//! - missing change defaults to zero
//! - missing high/low are approximated as `price ± |change| × k`, with `k`
//!   configured per metal (an intraday range estimate, not a measured one)
//! - metals no feed quotes can be derived as a fixed ratio of a live metal
//! - anything left falls back to a static reference quote

use crate::config::{DerivationRule, FallbackConfig, RangeFactors};
use crate::model::units::per_ounce_from_pound;
use crate::model::{FallbackReason, Metal, Provenance, Quote, RawQuote, Sourced};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Result of one source attempt for one metal
pub type SourceAttempt = Result<(RawQuote, &'static str), FallbackReason>;

/// Quote normalizer
#[derive(Debug, Clone)]
pub struct Normalizer {
    range_factors: RangeFactors,
    derivations: Vec<DerivationRule>,
    fallback: FallbackConfig,
}

impl Normalizer {
    pub fn new(
        range_factors: RangeFactors,
        derivations: Vec<DerivationRule>,
        fallback: FallbackConfig,
    ) -> Self {
        Self {
            range_factors,
            derivations,
            fallback,
        }
    }

    /// Complete a raw quote for `metal`
    pub fn normalize(&self, metal: Metal, raw: &RawQuote) -> Quote {
        let change = raw.change.unwrap_or(Decimal::ZERO);
        let spread = change.abs() * self.range_factors.for_metal(metal);

        Quote {
            price: raw.price,
            change,
            high: raw.high.unwrap_or(raw.price + spread),
            low: raw.low.unwrap_or(raw.price - spread),
        }
    }

    /// Static reference quote for `metal`
    pub fn fallback_quote(&self, metal: Metal) -> Quote {
        let price = match metal {
            Metal::Gold => self.fallback.gold,
            Metal::Silver => self.fallback.silver,
            Metal::Platinum => self.fallback.platinum,
            Metal::Copper => per_ounce_from_pound(self.fallback.copper_per_lb),
        };
        Quote::flat(price)
    }

    /// Derivation rule configured for `metal`, if any
    pub fn derivation_for(&self, metal: Metal) -> Option<&DerivationRule> {
        self.derivations.iter().find(|r| r.metal == metal)
    }

    /// First successful attempt for `metal`, normalized
    ///
    /// Returns the last failure reason when nothing succeeded.
    pub fn resolve(
        &self,
        metal: Metal,
        attempts: &[SourceAttempt],
    ) -> Result<Sourced<Quote>, FallbackReason> {
        match attempts.iter().find_map(|a| a.as_ref().ok()) {
            Some((raw, source)) => Ok(Sourced::new(
                self.normalize(metal, raw),
                Provenance::live(*source),
            )),
            None => Err(attempts
                .iter()
                .rev()
                .find_map(|a| a.as_ref().err().copied())
                .unwrap_or(FallbackReason::NoSource)),
        }
    }

    /// Resolve every metal from its source attempts
    ///
    /// Attempts are tried in order and the first success wins. Metals without
    /// a successful attempt are derived from a live primary metal when a rule
    /// exists, otherwise they get the static fallback quote tagged with the
    /// last failure reason.
    pub fn resolve_all(
        &self,
        metals: &[Metal],
        attempts: &BTreeMap<Metal, Vec<SourceAttempt>>,
    ) -> BTreeMap<Metal, Sourced<Quote>> {
        let mut resolved = BTreeMap::new();
        let mut unresolved = Vec::new();

        for &metal in metals {
            let tries = attempts.get(&metal).map(Vec::as_slice).unwrap_or(&[]);
            match self.resolve(metal, tries) {
                Ok(quote) => {
                    resolved.insert(metal, quote);
                }
                Err(reason) => unresolved.push((metal, reason)),
            }
        }

        for (metal, reason) in unresolved {
            let derived = self.derivation_for(metal).and_then(|rule| {
                resolved
                    .get(&rule.from)
                    .filter(|primary: &&Sourced<Quote>| primary.is_live())
                    .map(|primary| derive_from_ratio(&primary.value, rule))
            });

            let quote = match derived {
                Some(quote) => quote,
                None => {
                    tracing::warn!(%metal, %reason, "All sources failed, using static fallback");
                    Sourced::new(
                        self.fallback_quote(metal),
                        Provenance::Fallback { reason },
                    )
                }
            };
            resolved.insert(metal, quote);
        }

        resolved
    }

    /// Static fallback set for `metals`
    pub fn fallback_set(
        &self,
        metals: &[Metal],
        reason: FallbackReason,
    ) -> BTreeMap<Metal, Sourced<Quote>> {
        metals
            .iter()
            .map(|&m| {
                (
                    m,
                    Sourced::new(self.fallback_quote(m), Provenance::Fallback { reason }),
                )
            })
            .collect()
    }
}

/// Derive a secondary metal as a fixed ratio of a primary quote
///
/// Price and change scale exactly by `rule.ratio`; high/low are a symmetric
/// band of `rule.band` around the derived price.
pub fn derive_from_ratio(primary: &Quote, rule: &DerivationRule) -> Sourced<Quote> {
    let price = primary.price * rule.ratio;
    let quote = Quote {
        price,
        change: primary.change * rule.ratio,
        high: price * (Decimal::ONE + rule.band),
        low: price * (Decimal::ONE - rule.band),
    };

    Sourced::new(
        quote,
        Provenance::Derived {
            from: rule.from,
            ratio: rule.ratio,
        },
    )
}
