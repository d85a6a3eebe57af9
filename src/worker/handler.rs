//! Request handling: scrape, assemble, cache

use super::types::{CopperBlock, PremiumBlock, ShanghaiBlock, WesternBlock, WorkerQuote, LIVE_SOURCE};
use super::WorkerState;
use crate::config::WorkerConfig;
use crate::feed::scrape::{parse_copper_page, parse_shanghai_page, ShanghaiPage};
use crate::feed::{fetch_counted, FeedError};
use crate::model::units::{per_ounce_from_pound, troy_oz_per_kg};
use crate::premium::premium_percent;
use crate::telemetry::{record_worker_request, CacheOutcome};
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

const CACHE_KEY: &str = "shanghai-silver-copper";

const DEFAULT_SHANGHAI: Decimal = dec!(88.0);
const DEFAULT_WESTERN: Decimal = dec!(83.0);
const DEFAULT_PREMIUM: Decimal = dec!(5.0);
const DEFAULT_PERCENT: Decimal = dec!(6.0);
const DEFAULT_CNY_PER_KG: Decimal = dec!(20500);
const DEFAULT_COPPER_PER_LB: Decimal = dec!(4.50);

/// `GET /` and `GET /prices`
pub async fn get_prices(State(state): State<Arc<WorkerState>>) -> Response {
    let doc = match state.cache.get(CACHE_KEY).await {
        Some(mut doc) => {
            record_worker_request(CacheOutcome::Hit);
            doc.cached = true;
            doc
        }
        None => {
            record_worker_request(CacheOutcome::Miss);
            let doc = fetch_fresh(&state).await;
            if !doc.is_fallback() {
                state.cache.purge_expired().await;
                state.cache.insert(CACHE_KEY, doc.clone()).await;
            }
            doc
        }
    };

    with_cache_control(Json(doc).into_response(), state.config.max_age_secs)
}

fn with_cache_control(mut response: Response, max_age_secs: u64) -> Response {
    if let Ok(value) = HeaderValue::from_str(&format!("max-age={}", max_age_secs)) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}

/// Scrape both upstream pages
///
/// A Shanghai page failure yields the fallback document; a copper failure
/// only defaults the copper block.
async fn fetch_fresh(state: &WorkerState) -> WorkerQuote {
    let transport = state.transport.as_ref();
    let now = Utc::now();

    let page = match fetch_counted("shanghai_page", transport, &state.config.shanghai_url, |body| {
        Ok::<_, FeedError>(parse_shanghai_page(body))
    })
    .await
    {
        Ok(page) => page,
        Err(e) => return WorkerQuote::fallback(now, e.to_string()),
    };

    let copper = fetch_counted("copper_page", transport, &state.config.copper_url, |body| {
        parse_copper_page(body).ok_or_else(|| FeedError::Parse("no copper price on page".to_string()))
    })
    .await
    .ok();

    assemble(&page, copper, &state.config, now)
}

/// Build the worker document from scraped figures, filling gaps with defaults
pub fn assemble(
    page: &ShanghaiPage,
    copper_per_lb: Option<Decimal>,
    config: &WorkerConfig,
    now: DateTime<Utc>,
) -> WorkerQuote {
    let western = page.western;
    let shanghai = page
        .shanghai
        .or_else(|| western.and_then(|w| w.checked_mul(config.premium_multiplier)));

    let premium_usd = match (shanghai, western) {
        (Some(s), Some(w)) => s.checked_sub(w).unwrap_or(DEFAULT_PREMIUM),
        _ => page.premium.unwrap_or(DEFAULT_PREMIUM),
    };
    let percent = match western {
        Some(w) => premium_percent(premium_usd, w),
        None => DEFAULT_PERCENT,
    };

    let cny_per_kg = shanghai
        .and_then(|s| s.checked_mul(troy_oz_per_kg())?.checked_mul(config.cny_rate))
        .unwrap_or(DEFAULT_CNY_PER_KG);
    let cny_per_gram = cny_per_kg / Decimal::ONE_THOUSAND;

    let per_lb = copper_per_lb.unwrap_or(DEFAULT_COPPER_PER_LB);

    WorkerQuote {
        shanghai: ShanghaiBlock {
            usd_per_oz: shanghai.unwrap_or(DEFAULT_SHANGHAI),
            cny_per_kg,
            cny_per_gram,
            estimated: page.shanghai.is_none(),
        },
        western: WesternBlock {
            usd_per_oz: western.unwrap_or(DEFAULT_WESTERN),
        },
        premium: PremiumBlock {
            usd: premium_usd,
            percent,
        },
        copper: CopperBlock {
            per_lb,
            per_oz: per_ounce_from_pound(per_lb),
            live: copper_per_lb.is_some(),
        },
        timestamp: now,
        source: LIVE_SOURCE.to_string(),
        cached: false,
        error: None,
    }
}
