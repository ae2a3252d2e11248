//! Daily feed: current weather and a quote of the day, cached in the `local` area.
//!
//! Each item has its own freshness window. A fresh cache entry is served without a
//! request; otherwise one GET is made and, on any failure, the previous (stale)
//! entry is returned instead.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::Local;
use log::{debug, info, warn};
use serde_json::Value;

use crate::database::Storage;
use crate::services::http_client::{build_url, JsonFetcher};
use crate::types::daily::{
    DailyData, DailyDataStatus, DailyQuoteData, WeatherData, QUOTE_AUTHOR, QUOTE_PLACEHOLDER,
    UNKNOWN,
};
use crate::types::errors::{FetchError, StorageError};
use crate::types::settings::{ApiSettings, CacheSettings};
use crate::types::storage::StorageArea;

/// Storage key of the daily cache document.
pub const DAILY_KEY: &str = "armrest-daily-data";

const WEATHER_PATH: &str = "/v2/weather/forecast";
const QUOTE_PATH: &str = "/v2/hitokoto";

#[async_trait]
pub trait DailyCacheTrait {
    async fn get_weather(&self, city: &str) -> Option<WeatherData>;
    async fn get_daily_quote(&self) -> Option<DailyQuoteData>;
    async fn get_all_daily_data(&self, city: &str) -> DailyData;
    async fn refresh_daily_data(&self, city: &str) -> DailyData;
    fn clear_daily_cache(&self) -> Result<(), StorageError>;
    fn get_daily_data_status(&self) -> DailyDataStatus;
}

pub struct DailyCache {
    storage: Arc<Storage>,
    fetcher: Arc<dyn JsonFetcher>,
    base: String,
    weather_ttl_ms: i64,
    quote_ttl_ms: i64,
    persist_lock: Mutex<()>,
}

impl DailyCache {
    pub fn new(
        storage: Arc<Storage>,
        fetcher: Arc<dyn JsonFetcher>,
        api: &ApiSettings,
        cache: &CacheSettings,
    ) -> Self {
        Self {
            storage,
            fetcher,
            base: api.daily_base.clone(),
            weather_ttl_ms: secs_to_ms(cache.weather_ttl_secs),
            quote_ttl_ms: secs_to_ms(cache.quote_ttl_secs),
            persist_lock: Mutex::new(()),
        }
    }

    /// Current cache document. Missing or unreadable documents read as empty.
    fn stored(&self) -> DailyData {
        match self.storage.get_as::<DailyData>(StorageArea::Local, DAILY_KEY) {
            Ok(Some(data)) => data,
            Ok(None) => DailyData::default(),
            Err(e) => {
                warn!("daily: cache unreadable, treating as empty: {}", e);
                DailyData::default()
            }
        }
    }

    /// Merges one freshly fetched item into the stored document, keeping the other.
    fn persist<F>(&self, apply: F)
    where
        F: FnOnce(&mut DailyData),
    {
        let Ok(_guard) = self.persist_lock.lock() else {
            warn!("daily: persist lock poisoned, skipping cache write");
            return;
        };
        let mut data = self.stored();
        apply(&mut data);
        if let Err(e) = self.storage.set_as(StorageArea::Local, DAILY_KEY, &data) {
            warn!("daily: failed to write cache: {}", e);
        }
    }

    /// GETs `url` and returns the `data` member of a `{code: 200, data}` envelope.
    async fn fetch_envelope(&self, url: &str) -> Result<Value, FetchError> {
        let body = self.fetcher.get_json(url).await?;
        envelope_data(body)
    }

    async fn fetch_weather(&self, city: &str) -> Result<WeatherData, FetchError> {
        let url = build_url(&self.base, WEATHER_PATH, &[("city", city)])?;
        let data = self.fetch_envelope(&url).await?;
        Ok(parse_weather(&data, city, &local_update_time()))
    }

    async fn fetch_quote(&self) -> Result<DailyQuoteData, FetchError> {
        let url = build_url(&self.base, QUOTE_PATH, &[])?;
        let data = self.fetch_envelope(&url).await?;
        Ok(parse_quote(&data))
    }
}

#[async_trait]
impl DailyCacheTrait for DailyCache {
    async fn get_weather(&self, city: &str) -> Option<WeatherData> {
        let cached = self.stored();
        if let Some(weather) = &cached.weather {
            if is_fresh(cached.weather_last_updated, self.weather_ttl_ms, now()) {
                debug!("daily: serving cached weather for {}", weather.city);
                return cached.weather;
            }
        }

        match self.fetch_weather(city).await {
            Ok(weather) => {
                let stored = weather.clone();
                self.persist(|data| {
                    data.weather = Some(stored);
                    data.weather_last_updated = Some(now());
                });
                Some(weather)
            }
            Err(e) => {
                warn!("daily: weather fetch for {} failed: {}", city, e);
                self.stored().weather
            }
        }
    }

    async fn get_daily_quote(&self) -> Option<DailyQuoteData> {
        let cached = self.stored();
        if cached.daily_quote.is_some()
            && is_fresh(cached.daily_quote_last_updated, self.quote_ttl_ms, now())
        {
            debug!("daily: serving cached quote");
            return cached.daily_quote;
        }

        match self.fetch_quote().await {
            Ok(quote) => {
                let stored = quote.clone();
                self.persist(|data| {
                    data.daily_quote = Some(stored);
                    data.daily_quote_last_updated = Some(now());
                });
                Some(quote)
            }
            Err(e) => {
                warn!("daily: quote fetch failed: {}", e);
                self.stored().daily_quote
            }
        }
    }

    async fn get_all_daily_data(&self, city: &str) -> DailyData {
        let (weather, daily_quote) = tokio::join!(self.get_weather(city), self.get_daily_quote());
        let stored = self.stored();
        DailyData {
            weather,
            daily_quote,
            weather_last_updated: stored.weather_last_updated,
            daily_quote_last_updated: stored.daily_quote_last_updated,
        }
    }

    async fn refresh_daily_data(&self, city: &str) -> DailyData {
        if let Err(e) = self.clear_daily_cache() {
            warn!("daily: failed to clear cache before refresh: {}", e);
        }
        self.get_all_daily_data(city).await
    }

    fn clear_daily_cache(&self) -> Result<(), StorageError> {
        if self.storage.remove(StorageArea::Local, DAILY_KEY)? {
            info!("daily: cache cleared");
        }
        Ok(())
    }

    fn get_daily_data_status(&self) -> DailyDataStatus {
        let data = self.stored();
        let weather_cached = data.weather.is_some();
        let daily_quote_cached = data.daily_quote.is_some();
        DailyDataStatus {
            is_cached: weather_cached || daily_quote_cached,
            weather_cached,
            daily_quote_cached,
            weather_last_updated: data.weather_last_updated,
            daily_quote_last_updated: data.daily_quote_last_updated,
        }
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

fn local_update_time() -> String {
    Local::now().format("%Y/%m/%d %H:%M:%S").to_string()
}

/// True if `last_updated` lies within `ttl_ms` of `now_ms`.
pub fn is_fresh(last_updated: Option<i64>, ttl_ms: i64, now_ms: i64) -> bool {
    match last_updated {
        Some(at) => now_ms.saturating_sub(at) < ttl_ms,
        None => false,
    }
}

/// Unwraps the `{code, data}` envelope of the daily API.
pub fn envelope_data(body: Value) -> Result<Value, FetchError> {
    let code = body.get("code").and_then(Value::as_i64);
    if code != Some(200) {
        return Err(FetchError::ParseError(format!(
            "unexpected response code: {}",
            body.get("code").cloned().unwrap_or(Value::Null)
        )));
    }
    match body.get("data") {
        Some(data) if !data.is_null() => Ok(data.clone()),
        _ => Err(FetchError::ParseError("response has no data".to_string())),
    }
}

/// Non-empty string or number rendered as text.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field(value: Option<&Value>, key: &str) -> String {
    text(value.and_then(|v| v.get(key))).unwrap_or_else(|| UNKNOWN.to_string())
}

/// Maps the forecast payload onto [`WeatherData`].
///
/// The daily forecast wins over the hourly one; anything unreported becomes `未知`.
pub fn parse_weather(data: &Value, requested_city: &str, update_time: &str) -> WeatherData {
    let location = data.get("location");
    let today = data.get("daily_forecast").and_then(|f| f.get(0));
    let hourly = data.get("hourly_forecast").and_then(|f| f.get(0));

    let city = text(location.and_then(|l| l.get("city")))
        .or_else(|| text(location.and_then(|l| l.get("name"))))
        .unwrap_or_else(|| requested_city.to_string());

    let temperature = if today.is_some() {
        format!(
            "{}°C ~ {}°C",
            field(today, "min_temperature"),
            field(today, "max_temperature")
        )
    } else if hourly.is_some() {
        format!("{}°C", field(hourly, "temperature"))
    } else {
        UNKNOWN.to_string()
    };

    let weather = text(today.and_then(|t| t.get("day_condition")))
        .or_else(|| text(hourly.and_then(|h| h.get("condition"))))
        .unwrap_or_else(|| UNKNOWN.to_string());

    let wind = if today.is_some() {
        format!(
            "{} {}级",
            field(today, "day_wind_direction"),
            field(today, "day_wind_power")
        )
    } else if hourly.is_some() {
        format!(
            "{} {}级",
            field(hourly, "wind_direction"),
            field(hourly, "wind_power")
        )
    } else {
        UNKNOWN.to_string()
    };

    let humidity = field(today, "air_quality");

    WeatherData {
        city,
        temperature,
        weather,
        wind,
        humidity,
        update_time: update_time.to_string(),
    }
}

pub fn parse_quote(data: &Value) -> DailyQuoteData {
    DailyQuoteData {
        content: text(data.get("hitokoto")).unwrap_or_else(|| QUOTE_PLACEHOLDER.to_string()),
        author: QUOTE_AUTHOR.to_string(),
    }
}
