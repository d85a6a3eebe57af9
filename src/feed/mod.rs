//! Price feed module
//!
//! Source adapters for the upstream endpoints: a spot JSON API, a
//! comma-delimited quote feed, a forex rate API, the worker's regional JSON
//! document and scraped HTML pages. Every adapter makes exactly one request
//! per call through a [`Transport`] and reports failures as [`FeedError`];
//! substitution with fallback values happens in the pipeline.

mod delimited;
mod forex;
mod regional;
pub mod scrape;
mod spot_json;
mod transport;

pub use delimited::DelimitedFeed;
pub use forex::ForexFeed;
pub use regional::RegionalFeed;
pub use spot_json::SpotJsonFeed;
pub use transport::{HttpTransport, OfflineTransport};

use crate::model::{FallbackReason, Metal, RawQuote, Region};
use crate::premium::RegionalObservation;
use crate::telemetry::FetchOutcome;
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// Request could not be completed
    #[error("Request failed: {0}")]
    Network(String),
    /// Upstream answered with a non-2xx status
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    /// Response did not have the expected shape
    #[error("Malformed response: {0}")]
    Parse(String),
}

impl FeedError {
    /// Fallback reason recorded when this error forces a substitution
    pub fn reason(&self) -> FallbackReason {
        match self {
            FeedError::Network(_) | FeedError::Status { .. } => FallbackReason::NetworkFailure,
            FeedError::Parse(_) => FallbackReason::ParseFailure,
        }
    }

    pub(crate) fn outcome(&self) -> FetchOutcome {
        match self {
            FeedError::Network(_) | FeedError::Status { .. } => FetchOutcome::NetworkFailure,
            FeedError::Parse(_) => FetchOutcome::ParseFailure,
        }
    }
}

/// HTTP GET seam shared by all adapters
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` once and return the body as text
    async fn get_text(&self, url: &str) -> Result<String, FeedError>;
}

/// Everything a single source yielded in one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedBatch {
    /// Spot quotes in USD per troy ounce
    pub quotes: BTreeMap<Metal, RawQuote>,
    /// Regional price observations
    pub regional: BTreeMap<Region, RegionalObservation>,
}

/// Trait for quote source implementations
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Short name used in provenance, logs and metrics
    fn name(&self) -> &'static str;

    /// Make one request and parse everything the source offers
    async fn fetch(&self, transport: &dyn Transport) -> Result<FeedBatch, FeedError>;
}

/// Fetch through `transport` and count the outcome
pub(crate) async fn fetch_counted<T>(
    source: &'static str,
    transport: &dyn Transport,
    url: &str,
    parse: impl FnOnce(&str) -> Result<T, FeedError>,
) -> Result<T, FeedError> {
    let result = match transport.get_text(url).await {
        Ok(body) => parse(&body),
        Err(e) => Err(e),
    };

    match &result {
        Ok(_) => crate::telemetry::record_fetch(source, FetchOutcome::Success),
        Err(e) => {
            tracing::warn!(source, url, error = %e, "Feed request failed");
            crate::telemetry::record_fetch(source, e.outcome());
        }
    }

    result
}
