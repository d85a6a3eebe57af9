//! Configuration types for metal-premium

use crate::model::units::{is_plausible, MAX_PLAUSIBLE};
use crate::model::{Metal, Region};
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Spot JSON endpoint (wrapped `items` quote object)
pub const DEFAULT_SPOT_JSON_URL: &str = "https://data-asg.goldprice.org/dbXRates/USD";
/// Forex rates endpoint keyed by currency code
pub const DEFAULT_FOREX_URL: &str = "https://open.er-api.com/v6/latest/USD";
/// Shanghai silver page scraped by the worker
pub const DEFAULT_SHANGHAI_URL: &str = "https://goldsilver.ai/metal-prices/shanghai-silver-price";
/// Copper futures quote page scraped by the worker
pub const DEFAULT_COPPER_URL: &str = "https://www.cnbc.com/quotes/HG.1";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default = "default_regions")]
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: FeedsConfig::default(),
            pipeline: PipelineConfig::default(),
            fallback: FallbackConfig::default(),
            regions: default_regions(),
            worker: WorkerConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Upstream feed endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
    #[serde(default = "default_spot_json_url")]
    pub spot_json_url: Option<String>,
    /// Comma-delimited quote feed, one record per metal
    #[serde(default)]
    pub delimited_url: Option<String>,
    #[serde(default = "default_forex_url")]
    pub forex_url: Option<String>,
    /// Worker JSON document used as the Shanghai/copper source
    #[serde(default)]
    pub regional_url: Option<String>,
    /// Single-attempt request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_spot_json_url() -> Option<String> {
    Some(DEFAULT_SPOT_JSON_URL.to_string())
}
fn default_forex_url() -> Option<String> {
    Some(DEFAULT_FOREX_URL.to_string())
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; MetalPrices/1.0)".to_string()
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            spot_json_url: default_spot_json_url(),
            delimited_url: None,
            forex_url: default_forex_url(),
            regional_url: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Forex staleness window for `secs`; `None` when it does not fit a chrono duration
pub fn forex_max_age(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}

/// Pipeline shape: which metals, which currencies, which heuristics
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_metals")]
    pub metals: Vec<Metal>,
    /// Display currencies; the rate table always carries these plus region currencies
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_forex_refresh_secs")]
    pub forex_refresh_secs: u64,
    #[serde(default)]
    pub range_factors: RangeFactors,
    #[serde(default = "default_derivations")]
    pub derivations: Vec<DerivationRule>,
}

fn default_metals() -> Vec<Metal> {
    Metal::ALL.to_vec()
}
fn default_currencies() -> Vec<String> {
    vec!["USD".to_string(), "EUR".to_string(), "GBP".to_string()]
}
fn default_poll_interval_secs() -> u64 {
    60
}
fn default_forex_refresh_secs() -> u64 {
    3600
}
fn default_derivations() -> Vec<DerivationRule> {
    vec![DerivationRule {
        metal: Metal::Platinum,
        from: Metal::Gold,
        ratio: Decimal::new(20, 2), // 0.20
        band: default_band(),
    }]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            metals: default_metals(),
            currencies: default_currencies(),
            poll_interval_secs: default_poll_interval_secs(),
            forex_refresh_secs: default_forex_refresh_secs(),
            range_factors: RangeFactors::default(),
            derivations: default_derivations(),
        }
    }
}

/// Multipliers `k` used to approximate high/low as `price ± |change| × k`
#[derive(Debug, Clone, Deserialize)]
pub struct RangeFactors {
    #[serde(default = "default_half")]
    pub gold: Decimal,
    #[serde(default = "default_silver_factor")]
    pub silver: Decimal,
    #[serde(default = "default_half")]
    pub platinum: Decimal,
    #[serde(default = "default_half")]
    pub copper: Decimal,
}

fn default_half() -> Decimal {
    Decimal::new(5, 1) // 0.5
}
fn default_silver_factor() -> Decimal {
    Decimal::new(3, 1) // 0.3
}

impl Default for RangeFactors {
    fn default() -> Self {
        Self {
            gold: default_half(),
            silver: default_silver_factor(),
            platinum: default_half(),
            copper: default_half(),
        }
    }
}

impl RangeFactors {
    pub fn for_metal(&self, metal: Metal) -> Decimal {
        match metal {
            Metal::Gold => self.gold,
            Metal::Silver => self.silver,
            Metal::Platinum => self.platinum,
            Metal::Copper => self.copper,
        }
    }
}

/// Derive `metal` as a fixed ratio of `from` when no feed quotes it
#[derive(Debug, Clone, Deserialize)]
pub struct DerivationRule {
    pub metal: Metal,
    pub from: Metal,
    pub ratio: Decimal,
    /// Half-width of the synthetic high/low band, as a fraction of price
    #[serde(default = "default_band")]
    pub band: Decimal,
}

fn default_band() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

/// Static reference values used when every source for a metal fails
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_fallback_gold")]
    pub gold: Decimal,
    #[serde(default = "default_fallback_silver")]
    pub silver: Decimal,
    #[serde(default = "default_fallback_platinum")]
    pub platinum: Decimal,
    /// Copper is configured per pound, as it is quoted
    #[serde(default = "default_fallback_copper_per_lb")]
    pub copper_per_lb: Decimal,
}

fn default_fallback_gold() -> Decimal {
    Decimal::new(5068, 0)
}
fn default_fallback_silver() -> Decimal {
    Decimal::new(8260, 2) // 82.60
}
fn default_fallback_platinum() -> Decimal {
    Decimal::new(1015, 0)
}
fn default_fallback_copper_per_lb() -> Decimal {
    Decimal::new(450, 2) // 4.50
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            gold: default_fallback_gold(),
            silver: default_fallback_silver(),
            platinum: default_fallback_platinum(),
            copper_per_lb: default_fallback_copper_per_lb(),
        }
    }
}

/// Regional premium configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RegionConfig {
    pub region: Region,
    /// Western spot metal the region is compared against
    pub metal: Metal,
    pub currency: String,
    /// Applied to spot when no regional observation exists (1.06 = +6%)
    #[serde(default = "default_one")]
    pub premium_multiplier: Decimal,
    /// Import duty/tax multiplier for landed cost (e.g. 1.105 or 1.18)
    #[serde(default = "default_one")]
    pub duty_multiplier: Decimal,
}

fn default_one() -> Decimal {
    Decimal::ONE
}

fn default_regions() -> Vec<RegionConfig> {
    vec![
        RegionConfig {
            region: Region::Shanghai,
            metal: Metal::Silver,
            currency: "CNY".to_string(),
            premium_multiplier: Decimal::new(106, 2), // 1.06
            duty_multiplier: Decimal::ONE,
        },
        RegionConfig {
            region: Region::India,
            metal: Metal::Gold,
            currency: "INR".to_string(),
            premium_multiplier: Decimal::ONE,
            duty_multiplier: Decimal::new(1105, 3), // 1.105
        },
    ]
}

/// Edge worker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_shanghai_url")]
    pub shanghai_url: String,
    #[serde(default = "default_copper_url")]
    pub copper_url: String,
    /// Internal cache lifetime
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Freshness advertised to clients via Cache-Control
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    /// USD/CNY used for the CNY figures in the worker document
    #[serde(default = "default_cny_rate")]
    pub cny_rate: Decimal,
    #[serde(default = "default_worker_premium")]
    pub premium_multiplier: Decimal,
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}
fn default_shanghai_url() -> String {
    DEFAULT_SHANGHAI_URL.to_string()
}
fn default_copper_url() -> String {
    DEFAULT_COPPER_URL.to_string()
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_max_age_secs() -> u64 {
    60
}
fn default_cny_rate() -> Decimal {
    Decimal::new(724, 2) // 7.24
}
fn default_worker_premium() -> Decimal {
    Decimal::new(106, 2)
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            shanghai_url: default_shanghai_url(),
            copper_url: default_copper_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_age_secs: default_max_age_secs(),
            cny_rate: default_cny_rate(),
            premium_multiplier: default_worker_premium(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

/// Upper bound for any configured multiplier, ratio or range factor
pub const MAX_MULTIPLIER: Decimal = Decimal::ONE_THOUSAND;

/// Longest worker cache lifetime accepted
pub const MAX_CACHE_TTL_SECS: u64 = 86_400;

fn check_multiplier(name: &str, value: Decimal) -> anyhow::Result<()> {
    if value.is_sign_negative() || value > MAX_MULTIPLIER {
        anyhow::bail!("{} must be between 0 and {}, got {}", name, MAX_MULTIPLIER, value);
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or overflow the pipeline or worker
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.feeds.timeout_secs == 0 {
            anyhow::bail!("feeds.timeout_secs must be at least 1");
        }
        if self.pipeline.poll_interval_secs == 0 {
            anyhow::bail!("pipeline.poll_interval_secs must be at least 1");
        }
        if forex_max_age(self.pipeline.forex_refresh_secs).is_none() {
            anyhow::bail!(
                "pipeline.forex_refresh_secs is out of range: {}",
                self.pipeline.forex_refresh_secs
            );
        }
        if self.worker.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            anyhow::bail!(
                "worker.cache_ttl_secs must be at most {}, got {}",
                MAX_CACHE_TTL_SECS,
                self.worker.cache_ttl_secs
            );
        }

        for metal in Metal::ALL {
            check_multiplier("pipeline.range_factors", self.pipeline.range_factors.for_metal(metal))?;
        }
        for rule in &self.pipeline.derivations {
            check_multiplier("pipeline.derivations.ratio", rule.ratio)?;
            check_multiplier("pipeline.derivations.band", rule.band)?;
        }
        for region in &self.regions {
            check_multiplier("regions.premium_multiplier", region.premium_multiplier)?;
            check_multiplier("regions.duty_multiplier", region.duty_multiplier)?;
        }
        check_multiplier("worker.premium_multiplier", self.worker.premium_multiplier)?;
        check_multiplier("worker.cny_rate", self.worker.cny_rate)?;

        let fallback = &self.fallback;
        for (name, price) in [
            ("fallback.gold", fallback.gold),
            ("fallback.silver", fallback.silver),
            ("fallback.platinum", fallback.platinum),
            ("fallback.copper_per_lb", fallback.copper_per_lb),
        ] {
            if !is_plausible(price) {
                anyhow::bail!("{} must be a positive price up to {}, got {}", name, MAX_PLAUSIBLE, price);
            }
        }

        Ok(())
    }

    /// Region settings for `region`, if configured
    pub fn region(&self, region: Region) -> Option<&RegionConfig> {
        self.regions.iter().find(|r| r.region == region)
    }
}
