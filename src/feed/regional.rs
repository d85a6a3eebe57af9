//! Regional JSON feed
//!
//! Reads the document served by the worker (`serve` command or the deployed
//! edge function) and turns it into a Shanghai observation plus a copper
//! quote. A document the worker itself marked as fallback is treated as a
//! failed upstream.

use super::{fetch_counted, FeedBatch, FeedError, QuoteSource, Transport};
use crate::model::units::{is_plausible, per_ounce_from_pound};
use crate::model::{FallbackReason, Metal, RawQuote, Region};
use crate::premium::RegionalObservation;
use crate::worker::{WorkerQuote, FALLBACK_SOURCE};
use async_trait::async_trait;

const SOURCE: &str = "regional";

/// Worker document adapter
pub struct RegionalFeed {
    url: String,
}

impl RegionalFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Parse a worker document
    pub fn parse(body: &str) -> Result<FeedBatch, FeedError> {
        let doc: WorkerQuote =
            serde_json::from_str(body).map_err(|e| FeedError::Parse(e.to_string()))?;

        let mut batch = FeedBatch::default();

        if doc.source == FALLBACK_SOURCE {
            batch.regional.insert(
                Region::Shanghai,
                RegionalObservation::unavailable(FallbackReason::NetworkFailure),
            );
            return Ok(batch);
        }

        let shanghai = if doc.shanghai.estimated || !is_plausible(doc.shanghai.usd_per_oz) {
            RegionalObservation::unavailable(FallbackReason::NoSource)
        } else {
            RegionalObservation::UsdPerOz {
                price: doc.shanghai.usd_per_oz,
                source: SOURCE.to_string(),
            }
        };
        batch.regional.insert(Region::Shanghai, shanghai);

        if doc.copper.live && is_plausible(doc.copper.per_lb) {
            batch.quotes.insert(
                Metal::Copper,
                RawQuote::price_only(per_ounce_from_pound(doc.copper.per_lb)),
            );
        }

        Ok(batch)
    }
}

#[async_trait]
impl QuoteSource for RegionalFeed {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(&self, transport: &dyn Transport) -> Result<FeedBatch, FeedError> {
        fetch_counted(SOURCE, transport, &self.url, Self::parse).await
    }
}
