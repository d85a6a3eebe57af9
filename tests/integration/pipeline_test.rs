//! Pipeline cycles against stubbed upstreams

use crate::support::{StubTransport, COPPER_HTML, SHANGHAI_HTML};
use chrono::Utc;
use metal_premium::config::{Config, WorkerConfig};
use metal_premium::feed::scrape::{parse_copper_page, parse_shanghai_page};
use metal_premium::model::{FallbackReason, Metal, Provenance, Quote, Region};
use metal_premium::pipeline::{Pipeline, SnapshotStore};
use metal_premium::worker::assemble;
use rust_decimal_macros::dec;
use std::sync::Arc;

const SPOT_URL: &str = "https://spot.test/USD";
const FOREX_URL: &str = "https://fx.test/latest";
const WORKER_URL: &str = "https://worker.test/";

fn config() -> Config {
    let mut config = Config::default();
    config.feeds.spot_json_url = Some(SPOT_URL.to_string());
    config.feeds.forex_url = Some(FOREX_URL.to_string());
    config.feeds.regional_url = Some(WORKER_URL.to_string());
    config
}

#[tokio::test]
async fn test_all_sources_down_yields_fallback_set() {
    let transport = Arc::new(StubTransport::new());
    let pipeline = Pipeline::new(&config(), transport.clone());
    let snapshot = pipeline.cycle(&pipeline.bootstrap()).await;

    assert_eq!(snapshot.quote(Metal::Gold).unwrap().value, Quote::flat(dec!(5068)));
    assert_eq!(snapshot.quote(Metal::Silver).unwrap().value, Quote::flat(dec!(82.60)));
    assert_eq!(snapshot.quote(Metal::Platinum).unwrap().value, Quote::flat(dec!(1015)));
    assert_eq!(
        snapshot.quote(Metal::Copper).unwrap().value.price,
        dec!(4.50) / dec!(14.583)
    );
    for quote in snapshot.quotes.values() {
        assert_eq!(
            quote.provenance,
            Provenance::Fallback {
                reason: FallbackReason::NetworkFailure
            }
        );
    }

    // every region is still published, as an estimate
    let shanghai = snapshot.region(Region::Shanghai).unwrap();
    assert_eq!(shanghai.provenance, Provenance::Estimated);
    assert_eq!(shanghai.usd_per_oz, dec!(82.60) * dec!(1.06));

    // spot, regional and forex: one attempt each, no retries
    assert_eq!(transport.requests(), 3);
}

#[tokio::test]
async fn test_spot_json_cycle() {
    let transport = Arc::new(
        StubTransport::new()
            .with(
                SPOT_URL,
                r#"{"ts":1,"items":[{"curr":"USD","xauPrice":5068,"chgXau":-5.7,"xagPrice":82.6,"chgXag":1.0}]}"#,
            )
            .with(FOREX_URL, r#"{"result":"success","rates":{"USD":1,"EUR":0.9,"CNY":7.2,"INR":88}}"#),
    );
    let pipeline = Pipeline::new(&config(), transport);
    let snapshot = pipeline.cycle(&pipeline.bootstrap()).await;

    let gold = snapshot.quote(Metal::Gold).unwrap();
    assert_eq!(gold.value.high, dec!(5070.85));
    assert_eq!(gold.value.low, dec!(5065.15));

    let silver = snapshot.quote(Metal::Silver).unwrap();
    assert_eq!(silver.value.high, dec!(82.9));
    assert_eq!(silver.value.low, dec!(82.3));

    let platinum = snapshot.quote(Metal::Platinum).unwrap();
    assert_eq!(platinum.value.price, dec!(1013.6));
    assert_eq!(
        platinum.provenance,
        Provenance::Derived {
            from: Metal::Gold,
            ratio: dec!(0.20)
        }
    );

    assert_eq!(snapshot.rates.rate("EUR"), Some(dec!(0.9)));
    let india = snapshot.region(Region::India).unwrap();
    assert_eq!(india.usd_per_oz, dec!(5068) * dec!(1.105));
    assert_eq!(india.local_per_kg, india.usd_per_kg * dec!(88));
}

#[tokio::test]
async fn test_worker_document_feeds_shanghai_premium() {
    let doc = assemble(
        &parse_shanghai_page(SHANGHAI_HTML),
        parse_copper_page(COPPER_HTML),
        &WorkerConfig::default(),
        Utc::now(),
    );
    let transport = Arc::new(
        StubTransport::new()
            .with(SPOT_URL, r#"{"items":[{"xauPrice":5068,"xagPrice":83.62}]}"#)
            .with(WORKER_URL, serde_json::to_string(&doc).unwrap()),
    );
    let pipeline = Pipeline::new(&config(), transport);
    let snapshot = pipeline.cycle(&pipeline.bootstrap()).await;

    let shanghai = snapshot.region(Region::Shanghai).unwrap();
    assert_eq!(shanghai.provenance, Provenance::live("regional"));
    assert_eq!(shanghai.usd_per_oz, dec!(88.64));
    assert_eq!(shanghai.premium_usd, dec!(5.02));
    assert_eq!(
        shanghai.premium_percent,
        dec!(5.02) / dec!(83.62) * dec!(100)
    );

    let copper = snapshot.quote(Metal::Copper).unwrap();
    assert_eq!(copper.provenance, Provenance::live("regional"));
    assert_eq!(copper.value.price, dec!(4.5225) / dec!(14.583));
}

#[tokio::test]
async fn test_store_keeps_latest_cycle() {
    let transport = Arc::new(StubTransport::new());
    let pipeline = Pipeline::new(&config(), transport.clone());
    let store = SnapshotStore::new(pipeline.bootstrap());

    let first = pipeline.cycle(&*store.current().await).await;
    let second = pipeline.cycle(&first).await;

    // a slow cycle finishing late must not replace a newer one
    assert!(store.publish(second).await);
    assert!(!store.publish(first).await);
    assert_eq!(store.current().await.cycle, 2);
}

#[tokio::test]
async fn test_recovers_once_source_returns() {
    let transport = Arc::new(StubTransport::new());
    let pipeline = Pipeline::new(&config(), transport.clone());

    let down = pipeline.cycle(&pipeline.bootstrap()).await;
    assert!(!down.quote(Metal::Gold).unwrap().is_live());

    transport.set(SPOT_URL, r#"{"items":[{"xauPrice":2650.37,"chgXau":12.1}]}"#);
    let up = pipeline.cycle(&down).await;
    let gold = up.quote(Metal::Gold).unwrap();
    assert!(gold.is_live());
    assert_eq!(gold.value.price, dec!(2650.37));

    transport.remove(SPOT_URL);
    let down_again = pipeline.cycle(&up).await;
    assert_eq!(
        down_again.quote(Metal::Gold).unwrap().value,
        Quote::flat(dec!(5068))
    );
}
