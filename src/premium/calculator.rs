//! Premium calculation
//!
//! premium_usd     = regional_usd_per_oz - spot
//! premium_percent = premium_usd / spot * 100, or 0 when spot is 0
//!
//! When no regional observation is usable the regional price is synthesized
//! as `spot * premium_multiplier * duty_multiplier` and tagged `Estimated`.

use super::RegionalObservation;
use crate::config::RegionConfig;
use crate::model::units::{checked_per_kilogram, per_ounce_from_kilogram};
use crate::model::{
    ExchangeRateTable, FallbackReason, Provenance, Quote, RegionalPrice, Sourced,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Premium of a regional price over spot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Premium {
    pub usd: Decimal,
    pub percent: Decimal,
}

/// Percentage premium, guarded against a zero or negative spot
///
/// A ratio too large to represent also yields 0.
pub fn premium_percent(premium_usd: Decimal, spot: Decimal) -> Decimal {
    if spot <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    premium_usd
        .checked_div(spot)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Premium of `regional` over `spot`, both USD per troy ounce
pub fn premium(spot: Decimal, regional: Decimal) -> Premium {
    let usd = regional.checked_sub(spot).unwrap_or(Decimal::ZERO);
    Premium {
        usd,
        percent: premium_percent(usd, spot),
    }
}

/// Builds [`RegionalPrice`]s for one configured region
#[derive(Debug, Clone)]
pub struct PremiumCalculator {
    config: RegionConfig,
}

impl PremiumCalculator {
    pub fn new(config: RegionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Regional price used when nothing was observed; `None` on overflow
    pub fn estimate(&self, spot: Decimal) -> Option<Decimal> {
        spot.checked_mul(self.config.premium_multiplier)?
            .checked_mul(self.config.duty_multiplier)
    }

    /// Resolve an observation to USD per troy ounce
    ///
    /// Returns the fallback reason when the observation is unusable: missing,
    /// non-positive, or in a currency without a usable rate.
    fn observed_usd_per_oz(
        &self,
        observation: &RegionalObservation,
        rates: &ExchangeRateTable,
    ) -> Result<(Decimal, String), FallbackReason> {
        match observation {
            RegionalObservation::UsdPerOz { price, source } if *price > Decimal::ZERO => {
                Ok((*price, source.clone()))
            }
            RegionalObservation::LocalPerKg { amount, source } if *amount > Decimal::ZERO => {
                let usd_per_kg = rates
                    .to_usd(*amount, &self.config.currency)
                    .ok_or(FallbackReason::DivisionGuard)?;
                // Dividing by ~32.15 cannot overflow
                Ok((per_ounce_from_kilogram(usd_per_kg), source.clone()))
            }
            RegionalObservation::Unavailable { reason } => Err(*reason),
            _ => Err(FallbackReason::ParseFailure),
        }
    }

    /// Compute the regional price against `spot`
    pub fn calculate(
        &self,
        spot: &Sourced<Quote>,
        observation: &RegionalObservation,
        rates: &ExchangeRateTable,
        at: DateTime<Utc>,
    ) -> RegionalPrice {
        let spot_price = spot.value.price;

        let (usd_per_oz, provenance) = match self.observed_usd_per_oz(observation, rates) {
            Ok((price, source)) => (price, Provenance::Live { source }),
            Err(reason) => {
                tracing::debug!(
                    region = %self.config.region,
                    %reason,
                    "No regional observation, estimating from spot"
                );
                let estimate = self.estimate(spot_price).unwrap_or_else(|| {
                    tracing::warn!(
                        region = %self.config.region,
                        reason = %FallbackReason::DivisionGuard,
                        "Regional estimate overflowed, using spot"
                    );
                    spot_price
                });
                (estimate, Provenance::Estimated)
            }
        };

        if spot_price.is_zero() {
            tracing::warn!(region = %self.config.region, "Spot price is zero, premium set to 0%");
        }

        let Premium { usd, percent } = premium(spot_price, usd_per_oz);
        let usd_per_kg = checked_per_kilogram(usd_per_oz).unwrap_or_else(|| {
            tracing::warn!(region = %self.config.region, "Regional price per kg overflowed");
            Decimal::ZERO
        });
        let local_per_kg = match rates.from_usd(usd_per_kg, &self.config.currency) {
            Some(local) => local,
            None => {
                tracing::warn!(
                    currency = %self.config.currency,
                    "No usable exchange rate for regional currency"
                );
                Decimal::ZERO
            }
        };

        RegionalPrice {
            region: self.config.region,
            metal: self.config.metal,
            currency: self.config.currency.clone(),
            local_per_kg,
            local_per_gram: local_per_kg / Decimal::ONE_THOUSAND,
            usd_per_oz,
            usd_per_kg,
            premium_usd: usd,
            premium_percent: percent,
            last_updated: at,
            provenance,
        }
    }
}
