//! Weight unit conversions
//!
//! All prices inside the crate are quoted in USD per troy ounce. These helpers
//! move between troy ounces, grams, kilograms and avoirdupois pounds.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grams in one troy ounce
pub const GRAMS_PER_TROY_OZ: Decimal = dec!(31.1035);

/// Kilograms in one troy ounce
pub const KG_PER_TROY_OZ: Decimal = dec!(0.0311035);

/// Troy ounces in one avoirdupois pound (copper is quoted per pound)
pub const TROY_OZ_PER_POUND: Decimal = dec!(14.583);

/// Ceiling for any price or rate accepted from a feed
///
/// Keeps every downstream product well inside `Decimal`'s range.
pub const MAX_PLAUSIBLE: Decimal = dec!(1000000000);

/// Whether a fed price or rate is positive and below [`MAX_PLAUSIBLE`]
pub fn is_plausible(value: Decimal) -> bool {
    value > Decimal::ZERO && value <= MAX_PLAUSIBLE
}

/// Troy ounces in one kilogram (1000 / 31.1035, ~32.1507)
pub fn troy_oz_per_kg() -> Decimal {
    dec!(1000) / GRAMS_PER_TROY_OZ
}

/// Price per gram from a price per troy ounce
pub fn per_gram(price_per_oz: Decimal) -> Decimal {
    price_per_oz / GRAMS_PER_TROY_OZ
}

/// Price per kilogram from a price per troy ounce
pub fn per_kilogram(price_per_oz: Decimal) -> Decimal {
    price_per_oz / KG_PER_TROY_OZ
}

/// [`per_kilogram`] returning `None` instead of overflowing
pub fn checked_per_kilogram(price_per_oz: Decimal) -> Option<Decimal> {
    price_per_oz.checked_div(KG_PER_TROY_OZ)
}

/// Price per troy ounce from a price per kilogram
pub fn per_ounce_from_kilogram(price_per_kg: Decimal) -> Decimal {
    price_per_kg / troy_oz_per_kg()
}

/// Price per troy ounce from a price per avoirdupois pound
pub fn per_ounce_from_pound(price_per_lb: Decimal) -> Decimal {
    price_per_lb / TROY_OZ_PER_POUND
}

/// Unit accepted by the value calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Ounce,
    Gram,
    Kilogram,
}

impl FromStr for WeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "oz" | "ounce" | "ozt" => Ok(Self::Ounce),
            "g" | "gram" | "grams" => Ok(Self::Gram),
            "kg" | "kilogram" | "kilograms" => Ok(Self::Kilogram),
            other => Err(format!("unknown weight unit: {}", other)),
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ounce => "oz",
            Self::Gram => "g",
            Self::Kilogram => "kg",
        };
        f.write_str(s)
    }
}

/// Value of `amount` units of metal priced at `price_per_oz`; `None` on overflow
pub fn value_of(amount: Decimal, unit: WeightUnit, price_per_oz: Decimal) -> Option<Decimal> {
    let unit_price = match unit {
        WeightUnit::Ounce => price_per_oz,
        WeightUnit::Gram => per_gram(price_per_oz),
        WeightUnit::Kilogram => checked_per_kilogram(price_per_oz)?,
    };
    unit_price.checked_mul(amount)
}
