//! Core price types
//!
//! Quotes are always USD per troy ounce. Every figure the pipeline publishes
//! is wrapped in [`Sourced`] so live, derived, estimated and fallback values
//! can be told apart downstream.

mod rates;
pub mod units;

pub use rates::ExchangeRateTable;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Metals tracked by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metal {
    Gold,
    Silver,
    Platinum,
    Copper,
}

impl Metal {
    /// All metals in display order
    pub const ALL: [Metal; 4] = [Metal::Gold, Metal::Silver, Metal::Platinum, Metal::Copper];

    /// ISO 4217 style commodity code
    pub fn code(&self) -> &'static str {
        match self {
            Metal::Gold => "XAU",
            Metal::Silver => "XAG",
            Metal::Platinum => "XPT",
            Metal::Copper => "HG",
        }
    }

    /// Resolve a metal from the short codes used by the delimited feed
    pub fn from_feed_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "AU" | "XAU" => Some(Metal::Gold),
            "AG" | "XAG" => Some(Metal::Silver),
            "PT" | "XPT" => Some(Metal::Platinum),
            "CU" | "HG" => Some(Metal::Copper),
            _ => None,
        }
    }
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Metal::Gold => "gold",
            Metal::Silver => "silver",
            Metal::Platinum => "platinum",
            Metal::Copper => "copper",
        };
        f.write_str(s)
    }
}

impl FromStr for Metal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gold" => Ok(Metal::Gold),
            "silver" => Ok(Metal::Silver),
            "platinum" => Ok(Metal::Platinum),
            "copper" => Ok(Metal::Copper),
            other => Metal::from_feed_code(other).ok_or_else(|| format!("unknown metal: {}", s)),
        }
    }
}

/// A quote as read from a feed, possibly missing fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    /// USD per troy ounce
    pub price: Decimal,
    pub change: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
}

impl RawQuote {
    /// Raw quote carrying only a price
    pub fn price_only(price: Decimal) -> Self {
        Self {
            price,
            change: None,
            high: None,
            low: None,
        }
    }

    /// Raw quote with price and daily change
    pub fn with_change(price: Decimal, change: Decimal) -> Self {
        Self {
            price,
            change: Some(change),
            high: None,
            low: None,
        }
    }
}

/// A complete quote in USD per troy ounce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Decimal,
    /// Absolute daily change
    pub change: Decimal,
    pub high: Decimal,
    pub low: Decimal,
}

impl Quote {
    /// Flat quote with no change and a zero-width range
    pub fn flat(price: Decimal) -> Self {
        Self {
            price,
            change: Decimal::ZERO,
            high: price,
            low: price,
        }
    }

    /// Daily change as a percentage of the previous close
    ///
    /// Returns zero when the previous close (`price - change`) is zero.
    pub fn change_percent(&self) -> Decimal {
        let previous = self.price - self.change;
        if previous.is_zero() {
            return Decimal::ZERO;
        }
        self.change / previous * Decimal::ONE_HUNDRED
    }
}

/// Why a value had to be substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Request rejected, timed out or returned a non-2xx status
    NetworkFailure,
    /// Response shape was not what the adapter expected
    ParseFailure,
    /// A denominator was zero or unset
    DivisionGuard,
    /// No source is configured for the value
    NoSource,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FallbackReason::NetworkFailure => "network_failure",
            FallbackReason::ParseFailure => "parse_failure",
            FallbackReason::DivisionGuard => "division_guard",
            FallbackReason::NoSource => "no_source",
        };
        f.write_str(s)
    }
}

/// Where a published value came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Observed directly from a feed
    Live { source: String },
    /// Fixed ratio of another metal's live price
    Derived { from: Metal, ratio: Decimal },
    /// Synthesized from spot with a premium multiplier
    Estimated,
    /// Static reference value
    Fallback { reason: FallbackReason },
}

impl Provenance {
    pub fn live(source: impl Into<String>) -> Self {
        Provenance::Live {
            source: source.into(),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Provenance::Live { .. })
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Provenance::Live { .. } => "live",
            Provenance::Derived { .. } => "derived",
            Provenance::Estimated => "estimated",
            Provenance::Fallback { .. } => "fallback",
        }
    }
}

/// A value tagged with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: T,
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    pub fn new(value: T, provenance: Provenance) -> Self {
        Self { value, provenance }
    }

    pub fn is_live(&self) -> bool {
        self.provenance.is_live()
    }
}

/// Regional market a premium is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Shanghai,
    India,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Shanghai => f.write_str("shanghai"),
            Region::India => f.write_str("india"),
        }
    }
}

/// Regional price derived from a Western spot quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalPrice {
    pub region: Region,
    /// Metal the region is quoted for
    pub metal: Metal,
    /// Local currency code (e.g. "CNY")
    pub currency: String,
    pub local_per_kg: Decimal,
    pub local_per_gram: Decimal,
    pub usd_per_oz: Decimal,
    pub usd_per_kg: Decimal,
    /// Regional price minus Western spot, USD per troy ounce
    pub premium_usd: Decimal,
    pub premium_percent: Decimal,
    pub last_updated: DateTime<Utc>,
    pub provenance: Provenance,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_metal_from_feed_code() {
        assert_eq!(Metal::from_feed_code("AU"), Some(Metal::Gold));
        assert_eq!(Metal::from_feed_code("ag"), Some(Metal::Silver));
        assert_eq!(Metal::from_feed_code("HG"), Some(Metal::Copper));
        assert_eq!(Metal::from_feed_code("CU"), Some(Metal::Copper));
        assert_eq!(Metal::from_feed_code("PD"), None);
    }

    #[test]
    fn test_metal_parse() {
        assert_eq!("Gold".parse::<Metal>().unwrap(), Metal::Gold);
        assert_eq!("xpt".parse::<Metal>().unwrap(), Metal::Platinum);
        assert!("tin".parse::<Metal>().is_err());
    }

    #[test]
    fn test_change_percent() {
        let quote = Quote {
            price: dec!(110),
            change: dec!(10),
            high: dec!(111),
            low: dec!(100),
        };
        assert_eq!(quote.change_percent(), dec!(10));
    }

    #[test]
    fn test_change_percent_zero_previous() {
        let quote = Quote {
            price: dec!(5),
            change: dec!(5),
            high: dec!(5),
            low: dec!(5),
        };
        assert_eq!(quote.change_percent(), dec!(0));
    }

    #[test]
    fn test_flat_quote() {
        let quote = Quote::flat(dec!(5068));
        assert_eq!(quote.high, quote.price);
        assert_eq!(quote.low, quote.price);
        assert_eq!(quote.change, dec!(0));
    }

    #[test]
    fn test_provenance_labels() {
        assert_eq!(Provenance::live("spot_json").label(), "live");
        assert!(Provenance::live("spot_json").is_live());
        assert!(!Provenance::Estimated.is_live());
        let fallback = Provenance::Fallback {
            reason: FallbackReason::ParseFailure,
        };
        assert_eq!(fallback.label(), "fallback");
    }

    #[test]
    fn test_provenance_serializes_tagged() {
        let json = serde_json::to_value(Provenance::Fallback {
            reason: FallbackReason::NetworkFailure,
        })
        .unwrap();
        assert_eq!(json["kind"], "fallback");
        assert_eq!(json["reason"], "network_failure");
    }
}
