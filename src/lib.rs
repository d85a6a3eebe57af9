//! metal-premium: metal spot prices and regional premiums
//!
//! This library provides the core components for:
//! - Spot quote feeds (JSON API, delimited quote feed, worker document)
//! - Forex rate refresh with stale-table carry-over
//! - Quote normalization, ratio derivation and static fallbacks
//! - Shanghai and Indian-market premiums over Western spot
//! - A fixed-interval pipeline publishing immutable snapshots
//! - The scraping edge worker with a TTL cache
//! - Logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod feed;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod premium;
pub mod telemetry;
pub mod worker;
