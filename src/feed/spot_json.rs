//! Spot JSON feed
//!
//! The endpoint wraps its quote in an `items` array:
//! `{"items":[{"xauPrice":5068,"chgXau":-5.7,"xagPrice":82.6,"chgXag":0.4}]}`.
//! Prices are USD per troy ounce.

use super::{fetch_counted, FeedBatch, FeedError, QuoteSource, Transport};
use crate::model::units::{is_plausible, MAX_PLAUSIBLE};
use crate::model::{Metal, RawQuote};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

const SOURCE: &str = "spot_json";

#[derive(Debug, Deserialize)]
struct SpotResponse {
    items: Vec<SpotItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpotItem {
    #[serde(default)]
    xau_price: Option<Decimal>,
    #[serde(default)]
    chg_xau: Option<Decimal>,
    #[serde(default)]
    xag_price: Option<Decimal>,
    #[serde(default)]
    chg_xag: Option<Decimal>,
    #[serde(default)]
    xpt_price: Option<Decimal>,
    #[serde(default)]
    chg_xpt: Option<Decimal>,
}

/// Spot price JSON API adapter
pub struct SpotJsonFeed {
    url: String,
}

impl SpotJsonFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Parse the wrapped quote object
    ///
    /// Metals absent from the first item are simply not in the batch.
    pub fn parse(body: &str) -> Result<FeedBatch, FeedError> {
        let response: SpotResponse =
            serde_json::from_str(body).map_err(|e| FeedError::Parse(e.to_string()))?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| FeedError::Parse("empty items array".to_string()))?;

        let mut batch = FeedBatch::default();
        let pairs = [
            (Metal::Gold, item.xau_price, item.chg_xau),
            (Metal::Silver, item.xag_price, item.chg_xag),
            (Metal::Platinum, item.xpt_price, item.chg_xpt),
        ];
        for (metal, price, change) in pairs {
            if let Some(price) = price.filter(|p| is_plausible(*p)) {
                batch.quotes.insert(
                    metal,
                    RawQuote {
                        price,
                        change: change.filter(|c| c.abs() <= MAX_PLAUSIBLE),
                        high: None,
                        low: None,
                    },
                );
            }
        }

        if batch.quotes.is_empty() {
            return Err(FeedError::Parse("no metal prices in item".to_string()));
        }

        Ok(batch)
    }
}

#[async_trait]
impl QuoteSource for SpotJsonFeed {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(&self, transport: &dyn Transport) -> Result<FeedBatch, FeedError> {
        fetch_counted(SOURCE, transport, &self.url, Self::parse).await
    }
}
