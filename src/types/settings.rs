use serde::{Deserialize, Serialize};

/// Top-level dashboard settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DashboardSettings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub weather: WeatherSettings,
}

/// Base URLs of the external services the dashboard consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    pub daily_base: String,
    pub geocode_base: String,
    pub proxy_base: String,
    pub microlink_base: String,
    pub favicon_base: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            daily_base: "https://60s.viki.moe".to_string(),
            geocode_base: "https://api.bigdatacloud.net".to_string(),
            proxy_base: "https://api.allorigins.win".to_string(),
            microlink_base: "https://api.microlink.io".to_string(),
            favicon_base: "https://www.google.com/s2/favicons".to_string(),
        }
    }
}

/// Freshness windows for the daily feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    pub weather_ttl_secs: u64,
    pub quote_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            weather_ttl_secs: 60 * 60,
            quote_ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Weather location preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSettings {
    pub default_city: String,
    pub fallback_city: String,
    pub locality_language: String,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            default_city: "杭州".to_string(),
            fallback_city: "北京".to_string(),
            locality_language: "zh".to_string(),
        }
    }
}
