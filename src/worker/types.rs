//! Worker JSON document

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// `source` value of the document served when the Shanghai page is unreachable
pub const FALLBACK_SOURCE: &str = "fallback";

/// `source` value of a scraped document
pub const LIVE_SOURCE: &str = "goldsilver.ai + cnbc";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShanghaiBlock {
    pub usd_per_oz: Decimal,
    pub cny_per_kg: Decimal,
    pub cny_per_gram: Decimal,
    /// Price was not read from the page
    #[serde(default)]
    pub estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WesternBlock {
    pub usd_per_oz: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumBlock {
    pub usd: Decimal,
    pub percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopperBlock {
    pub per_lb: Decimal,
    pub per_oz: Decimal,
    /// Price was read from the quote page rather than defaulted
    #[serde(default)]
    pub live: bool,
}

/// Document returned by `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerQuote {
    pub shanghai: ShanghaiBlock,
    pub western: WesternBlock,
    pub premium: PremiumBlock,
    pub copper: CopperBlock,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    /// Served from the worker cache
    #[serde(default)]
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerQuote {
    /// Static document used when the Shanghai page cannot be fetched
    pub fn fallback(now: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            shanghai: ShanghaiBlock {
                usd_per_oz: dec!(88.0),
                cny_per_kg: dec!(20500),
                cny_per_gram: dec!(20.5),
                estimated: true,
            },
            western: WesternBlock {
                usd_per_oz: dec!(83.0),
            },
            premium: PremiumBlock {
                usd: dec!(5.0),
                percent: dec!(6.0),
            },
            copper: CopperBlock {
                per_lb: dec!(4.50),
                per_oz: dec!(0.31),
                live: false,
            },
            timestamp: now,
            source: FALLBACK_SOURCE.to_string(),
            cached: false,
            error: Some(error.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == FALLBACK_SOURCE
    }
}
