//! Regional premium module
//!
//! Compares regional metal prices (Shanghai, India) with Western spot and
//! derives the secondary units shown for each region.

mod calculator;
mod session;

pub use calculator::{premium, premium_percent, Premium, PremiumCalculator};
pub use session::{beijing_time, sge_session_open};

use crate::model::FallbackReason;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A regional price as it was observed, before comparison with spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionalObservation {
    /// Local currency per kilogram
    LocalPerKg { amount: Decimal, source: String },
    /// Already converted to USD per troy ounce
    UsdPerOz { price: Decimal, source: String },
    /// No usable regional figure
    Unavailable { reason: FallbackReason },
}

impl RegionalObservation {
    pub fn unavailable(reason: FallbackReason) -> Self {
        RegionalObservation::Unavailable { reason }
    }
}
