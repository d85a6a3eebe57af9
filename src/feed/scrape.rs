//! Text-pattern extraction from scraped HTML pages
//!
//! Patterns are tied to third-party markup and may silently stop matching;
//! every extractor returns `None` instead of failing.

use crate::model::units::is_plausible;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

/// Shanghai price: `font-bold">88.64</span> ... USD/OZ`
static SHANGHAI_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"font-bold[^>]*>(\d+\.\d+)</span>[\s\S]*?USD/OZ").expect("valid pattern")
});

/// Western spot in the silver-coloured span, with optional hydration comment:
/// `color:#c0c0c0">$<!-- -->83.62`
static WESTERN_SPOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"color:#c0c0c0[^>]*>\$(?:<!--\s*-->)?(\d+\.\d+)").expect("valid pattern")
});

/// Premium line: `+<!-- -->$<!-- -->5.02`
static PREMIUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+(?:<!--\s*-->)?\$(?:<!--\s*-->)?(\d+\.\d+)").expect("valid pattern")
});

/// Copper last price embedded as JSON: `"last":"4.5225"`
static COPPER_LAST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""last":"?([\d.]+)"?"#).expect("valid pattern"));

/// Figures extracted from the Shanghai silver page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShanghaiPage {
    /// Shanghai silver, USD per troy ounce
    pub shanghai: Option<Decimal>,
    /// Western spot silver, USD per troy ounce
    pub western: Option<Decimal>,
    /// Premium as printed on the page, USD per troy ounce
    pub premium: Option<Decimal>,
}

/// First captured number, kept only when it is a plausible price
///
/// A zero means the page rendered a placeholder and counts as missing.
fn first_capture(pattern: &Regex, text: &str) -> Option<Decimal> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| Decimal::from_str(m.as_str()).ok())
        .filter(|v| is_plausible(*v))
}

/// Extract the Shanghai, Western and premium figures
pub fn parse_shanghai_page(html: &str) -> ShanghaiPage {
    ShanghaiPage {
        shanghai: first_capture(&SHANGHAI_PRICE, html),
        western: first_capture(&WESTERN_SPOT, html),
        premium: first_capture(&PREMIUM, html),
    }
}

/// Extract copper's last price, USD per pound
pub fn parse_copper_page(html: &str) -> Option<Decimal> {
    first_capture(&COPPER_LAST, html)
}
