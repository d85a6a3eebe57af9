//! Configuration loading

use metal_premium::config::Config;
use metal_premium::model::{Metal, Region};
use metal_premium::telemetry::LogFormat;
use rust_decimal_macros::dec;
use std::io::Write;

#[test]
fn test_example_config_parses() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();

    assert_eq!(config.pipeline.metals, Metal::ALL.to_vec());
    assert_eq!(config.pipeline.poll_interval_secs, 60);
    assert_eq!(config.fallback.gold, dec!(5068));
    assert_eq!(config.regions.len(), 2);
    assert_eq!(
        config.region(Region::India).unwrap().duty_multiplier,
        dec!(1.105)
    );
    assert_eq!(config.worker.cache_ttl_secs, 300);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
}

#[test]
fn test_partial_file_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [[regions]]
        region = "india"
        metal = "gold"
        currency = "INR"
        duty_multiplier = 1.18

        [telemetry]
        log_format = "json"
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.regions.len(), 1);
    assert_eq!(config.regions[0].duty_multiplier, dec!(1.18));
    assert_eq!(config.regions[0].premium_multiplier, dec!(1));
    assert_eq!(config.telemetry.log_format, LogFormat::Json);
    assert_eq!(config.pipeline.forex_refresh_secs, 3600);
    assert!(config.feeds.spot_json_url.is_some());
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::load("/nonexistent/metal-premium.toml").is_err());
}
