//! Comma-delimited quote feed
//!
//! One record per line, fields addressed by position:
//!
//! ```text
//! 0    1   2    3          4     5     6     7      8         9    10
//! CODE,CCY,UNIT,TIMESTAMP,BID,ASK,MID,CHANGE,CHANGE_PCT,LOW,HIGH
//! AU,USD,oz,171234,2100.5,2101.0,2100.75,3.2,0.15,2095,2105
//! ```
//!
//! Records quoted per pound (`lb`) are converted to troy ounces.

use super::{fetch_counted, FeedBatch, FeedError, QuoteSource, Transport};
use crate::model::units::{is_plausible, per_ounce_from_pound, MAX_PLAUSIBLE};
use crate::model::{Metal, RawQuote};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;

const SOURCE: &str = "delimited";

/// Minimum number of fields in a record
pub const MIN_FIELDS: usize = 11;

const FIELD_CODE: usize = 0;
const FIELD_CURRENCY: usize = 1;
const FIELD_UNIT: usize = 2;
const FIELD_PRICE: usize = 4;
const FIELD_CHANGE: usize = 7;
const FIELD_LOW: usize = 9;
const FIELD_HIGH: usize = 10;

/// Delimited text feed adapter
pub struct DelimitedFeed {
    url: String,
}

impl DelimitedFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Parse a single record
    pub fn parse_record(line: &str) -> Result<(Metal, RawQuote), FeedError> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < MIN_FIELDS {
            return Err(FeedError::Parse(format!(
                "expected at least {} fields, got {}",
                MIN_FIELDS,
                fields.len()
            )));
        }

        let metal = Metal::from_feed_code(fields[FIELD_CODE]).ok_or_else(|| {
            FeedError::Parse(format!("unknown metal code: {}", fields[FIELD_CODE]))
        })?;

        if !fields[FIELD_CURRENCY].eq_ignore_ascii_case("USD") {
            return Err(FeedError::Parse(format!(
                "unsupported currency: {}",
                fields[FIELD_CURRENCY]
            )));
        }

        let per_pound = match fields[FIELD_UNIT].to_lowercase().as_str() {
            "oz" | "ozt" => false,
            "lb" => true,
            other => return Err(FeedError::Parse(format!("unsupported unit: {}", other))),
        };

        let to_ounce = |value: Decimal| {
            if per_pound {
                per_ounce_from_pound(value)
            } else {
                value
            }
        };

        let price = to_ounce(parse_field(&fields, FIELD_PRICE)?);
        if !is_plausible(price) {
            return Err(FeedError::Parse(format!("implausible price: {}", price)));
        }
        let change = to_ounce(parse_field(&fields, FIELD_CHANGE)?);
        let low = to_ounce(parse_field(&fields, FIELD_LOW)?);
        let high = to_ounce(parse_field(&fields, FIELD_HIGH)?);

        Ok((
            metal,
            RawQuote {
                price,
                change: Some(change),
                high: Some(high),
                low: Some(low),
            },
        ))
    }

    /// Parse a whole feed body; malformed records are skipped
    pub fn parse(body: &str) -> Result<FeedBatch, FeedError> {
        let mut batch = FeedBatch::default();

        for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match Self::parse_record(line) {
                Ok((metal, quote)) => {
                    batch.quotes.insert(metal, quote);
                }
                Err(e) => {
                    tracing::debug!(record = line, error = %e, "Skipping delimited record");
                }
            }
        }

        if batch.quotes.is_empty() {
            return Err(FeedError::Parse("no valid records".to_string()));
        }

        Ok(batch)
    }
}

fn parse_field(fields: &[&str], index: usize) -> Result<Decimal, FeedError> {
    let value = Decimal::from_str(fields[index])
        .map_err(|e| FeedError::Parse(format!("field {} ({:?}): {}", index, fields[index], e)))?;
    if value.abs() > MAX_PLAUSIBLE {
        return Err(FeedError::Parse(format!("field {} out of range: {}", index, value)));
    }
    Ok(value)
}

#[async_trait]
impl QuoteSource for DelimitedFeed {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(&self, transport: &dyn Transport) -> Result<FeedBatch, FeedError> {
        fetch_counted(SOURCE, transport, &self.url, Self::parse).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_record_positional() {
        let (metal, quote) = DelimitedFeed::parse_record(
            "AU,USD,oz,171234,2100.5,2101.0,2100.75,3.2,0.15,2095,2105",
        )
        .unwrap();

        assert_eq!(metal, Metal::Gold);
        assert_eq!(quote.price, dec!(2100.5));
        assert_eq!(quote.change, Some(dec!(3.2)));
        assert_eq!(quote.low, Some(dec!(2095)));
        assert_eq!(quote.high, Some(dec!(2105)));
    }

    #[test]
    fn test_parse_record_too_few_fields() {
        let err = DelimitedFeed::parse_record("AU,USD,oz,171234,2100.5,2101.0").unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
        assert!(err.to_string().contains("expected at least 11 fields, got 6"));
    }

    #[test]
    fn test_parse_record_bad_number() {
        let result =
            DelimitedFeed::parse_record("AG,USD,oz,171234,n/a,31.6,31.55,0.1,0.3,31.2,31.9");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_record_unknown_code() {
        let result =
            DelimitedFeed::parse_record("ZN,USD,oz,171234,1.0,1.0,1.0,0.1,0.3,0.9,1.1");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_record_non_usd() {
        let result =
            DelimitedFeed::parse_record("AU,EUR,oz,171234,1900,1901,1900.5,3.2,0.15,1895,1905");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_record_per_pound() {
        let (metal, quote) = DelimitedFeed::parse_record(
            "CU,USD,lb,171234,14.583,14.6,14.59,0.14583,1.0,14.583,29.166",
        )
        .unwrap();

        assert_eq!(metal, Metal::Copper);
        assert_eq!(quote.price, dec!(1));
        assert_eq!(quote.change, Some(dec!(0.01)));
        assert_eq!(quote.high, Some(dec!(2)));
    }

    #[test]
    fn test_parse_body_skips_bad_lines() {
        let body = "\
            AU,USD,oz,171234,2100.5,2101.0,2100.75,3.2,0.15,2095,2105\n\
            garbage\n\
            \n\
            AG,USD,oz,171234,31.5,31.6,31.55,0.1,0.3,31.2,31.9\n";

        let batch = DelimitedFeed::parse(body).unwrap();
        assert_eq!(batch.quotes.len(), 2);
        assert_eq!(batch.quotes[&Metal::Silver].price, dec!(31.5));
    }

    #[test]
    fn test_parse_record_out_of_range() {
        let huge = "AU,USD,oz,171234,1000000000000000000000000000,1,1,3.2,0.15,2095,2105";
        assert!(DelimitedFeed::parse_record(huge).is_err());

        let huge_change = "AU,USD,oz,171234,2100.5,2101.0,2100.75,1000000000000000000000000000,0.15,2095,2105";
        assert!(DelimitedFeed::parse_record(huge_change).is_err());

        let zero = "AU,USD,oz,171234,0,2101.0,2100.75,3.2,0.15,2095,2105";
        assert!(DelimitedFeed::parse_record(zero).is_err());
    }

    #[test]
    fn test_parse_body_all_invalid() {
        assert!(DelimitedFeed::parse("nope\nstill nope").is_err());
        assert!(DelimitedFeed::parse("").is_err());
    }
}
