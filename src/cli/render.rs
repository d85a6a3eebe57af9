//! Plain-text rendering of snapshots for the terminal

use crate::model::units::{per_gram, per_kilogram};
use crate::model::{Provenance, Quote, RegionalPrice, Sourced};
use crate::pipeline::Snapshot;
use crate::premium::sge_session_open;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol used as a prefix, if the code has one
fn symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "CNY" => Some("¥"),
        "INR" => Some("₹"),
        _ => None,
    }
}

/// Group the integer digits of a non-negative decimal string in threes
fn group_thousands(digits: &str) -> String {
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

/// Format `amount` in currency `code` with `decimals` fixed places
///
/// `format_money(dec!(1234.5), "USD", 2)` gives `$1,234.50`.
pub fn format_money(amount: Decimal, code: &str, decimals: u32) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let body = group_thousands(&format!("{:.*}", decimals as usize, rounded));
    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    match symbol(code) {
        Some(sym) => format!("{}{}{}", sign, sym, body),
        None => format!("{}{} {}", sign, code, body),
    }
}

/// Like [`format_money`] but always carries a sign
pub fn format_change(amount: Decimal, code: &str) -> String {
    if amount.is_sign_negative() {
        format_money(amount, code, 2)
    } else {
        format!("+{}", format_money(amount, code, 2))
    }
}

pub fn format_percent(percent: Decimal, decimals: u32) -> String {
    let rounded = percent.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() { "" } else { "+" };
    format!("{}{:.*}%", sign, decimals as usize, rounded)
}

/// Short provenance tag, e.g. `live: spot_json` or `fallback: network_failure`
pub fn provenance_tag(provenance: &Provenance) -> String {
    match provenance {
        Provenance::Live { source } => format!("live: {}", source),
        Provenance::Derived { from, ratio } => format!("derived: {} x {}", ratio, from),
        Provenance::Estimated => "estimated".to_string(),
        Provenance::Fallback { reason } => format!("fallback: {}", reason),
    }
}

fn quote_line(name: &str, quote: &Sourced<Quote>, code: &str, rate: Decimal) -> String {
    let q = &quote.value;
    format!(
        "{:<9} {:>12} {:>10} ({})  /g {}  /kg {}  H {} L {}  [{}]",
        name,
        format_money(q.price * rate, code, 2),
        format_change(q.change * rate, code),
        format_percent(q.change_percent(), 2),
        format_money(per_gram(q.price) * rate, code, 2),
        format_money(per_kilogram(q.price) * rate, code, 0),
        format_money(q.high * rate, code, 2),
        format_money(q.low * rate, code, 2),
        provenance_tag(&quote.provenance),
    )
}

fn region_line(price: &RegionalPrice) -> String {
    format!(
        "{:<9} {:<8} {}/oz  {} ({})  {}/kg  {}/g  [{}]",
        price.region.to_string(),
        price.metal.to_string(),
        format_money(price.usd_per_oz, "USD", 2),
        format_change(price.premium_usd, "USD"),
        format_percent(price.premium_percent, 1),
        format_money(price.local_per_kg, &price.currency, 0),
        format_money(price.local_per_gram, &price.currency, 2),
        provenance_tag(&price.provenance),
    )
}

/// Human-readable summary of a snapshot in `currency`
///
/// Unknown currencies fall back to USD.
pub fn render_snapshot(snapshot: &Snapshot, currency: &str, now: DateTime<Utc>) -> String {
    let currency = currency.to_uppercase();
    let (code, rate) = match snapshot.rates.rate(&currency) {
        Some(rate) if rate > Decimal::ZERO => (currency.as_str(), rate),
        _ => ("USD", Decimal::ONE),
    };

    let mut lines = vec![format!(
        "Cycle {} at {}",
        snapshot.cycle,
        snapshot.taken_at.format("%Y-%m-%d %H:%M:%S UTC")
    )];

    for (metal, quote) in &snapshot.quotes {
        let name = metal.to_string();
        lines.push(quote_line(&name, quote, code, rate));
    }

    if !snapshot.regions.is_empty() {
        lines.push(String::new());
        lines.extend(snapshot.regions.iter().map(region_line));
    }

    lines.push(String::new());
    lines.push(format!(
        "SGE session: {}",
        if sge_session_open(now) { "open" } else { "closed" }
    ));
    lines.push(format!(
        "Rates: {} currencies [{}]",
        snapshot.rates.len(),
        provenance_tag(&snapshot.rates_provenance)
    ));

    lines.join("\n")
}
