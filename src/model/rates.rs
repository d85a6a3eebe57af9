//! Currency exchange rate table

use super::units::is_plausible;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rates per USD keyed by currency code
///
/// A failed refresh never clears the table; stale rates stay in use until a
/// later refresh succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateTable {
    rates: BTreeMap<String, Decimal>,
    /// When the table was last refreshed from a live feed
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ExchangeRateTable {
    fn default() -> Self {
        Self::from_rates([
            ("USD", dec!(1)),
            ("EUR", dec!(0.92)),
            ("GBP", dec!(0.79)),
            ("CNY", dec!(7.24)),
            ("INR", dec!(90.74)),
        ])
    }
}

impl ExchangeRateTable {
    /// Build a table from `(code, rate)` pairs; USD is always present at 1
    pub fn from_rates<K: AsRef<str>>(rates: impl IntoIterator<Item = (K, Decimal)>) -> Self {
        let mut table = Self {
            rates: BTreeMap::new(),
            updated_at: None,
        };
        table.rates.insert("USD".to_string(), Decimal::ONE);
        for (code, rate) in rates {
            table.rates.insert(code.as_ref().to_uppercase(), rate);
        }
        table
    }

    /// Rate for a currency code, units of currency per USD
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(&code.to_uppercase()).copied()
    }

    /// Convert a USD amount into `code`; `None` for unknown codes or overflow
    pub fn from_usd(&self, usd: Decimal, code: &str) -> Option<Decimal> {
        self.rate(code).and_then(|rate| usd.checked_mul(rate))
    }

    /// Convert an amount in `code` into USD; `None` for unknown or zero rates
    pub fn to_usd(&self, amount: Decimal, code: &str) -> Option<Decimal> {
        self.rate(code).and_then(|rate| amount.checked_div(rate))
    }

    /// Merge freshly fetched rates into the table
    ///
    /// Codes missing from `fresh` keep their previous value. Rates that are
    /// non-positive or implausibly large are ignored. Returns the number of
    /// rates applied.
    pub fn merge<K: AsRef<str>>(
        &mut self,
        fresh: impl IntoIterator<Item = (K, Decimal)>,
        at: DateTime<Utc>,
    ) -> usize {
        let mut applied = 0;
        for (code, rate) in fresh {
            if !is_plausible(rate) {
                continue;
            }
            let code = code.as_ref().to_uppercase();
            if code == "USD" {
                continue;
            }
            self.rates.insert(code, rate);
            applied += 1;
        }
        if applied > 0 {
            self.updated_at = Some(at);
        }
        applied
    }

    /// Whether the table is due for a refresh
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.updated_at {
            Some(at) => now - at >= max_age,
            None => true,
        }
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
