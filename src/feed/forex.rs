//! Forex rate feed
//!
//! Accepts either a wrapped `{"rates": {"EUR": 0.92, ...}}` document or a bare
//! code-to-rate map. Rates are units of currency per USD.

use super::{fetch_counted, FeedError, Transport};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

const SOURCE: &str = "forex";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ForexResponse {
    Wrapped { rates: BTreeMap<String, Decimal> },
    Bare(BTreeMap<String, Decimal>),
}

/// Forex rate API adapter
pub struct ForexFeed {
    url: String,
}

impl ForexFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Parse a rate document into upper-cased codes
    pub fn parse(body: &str) -> Result<BTreeMap<String, Decimal>, FeedError> {
        let response: ForexResponse =
            serde_json::from_str(body).map_err(|e| FeedError::Parse(e.to_string()))?;

        let rates = match response {
            ForexResponse::Wrapped { rates } => rates,
            ForexResponse::Bare(rates) => rates,
        };

        let rates: BTreeMap<String, Decimal> = rates
            .into_iter()
            .map(|(code, rate)| (code.to_uppercase(), rate))
            .collect();

        if rates.is_empty() {
            return Err(FeedError::Parse("no rates in response".to_string()));
        }

        Ok(rates)
    }

    /// Fetch the current rate map
    pub async fn fetch(
        &self,
        transport: &dyn Transport,
    ) -> Result<BTreeMap<String, Decimal>, FeedError> {
        fetch_counted(SOURCE, transport, &self.url, Self::parse).await
    }
}
