use serde::{Deserialize, Serialize};

/// Placeholder used by the weather service for fields it did not report.
pub const UNKNOWN: &str = "未知";
pub const QUOTE_AUTHOR: &str = "一言";
pub const QUOTE_PLACEHOLDER: &str = "暂无";

/// Weather readout shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub city: String,
    pub temperature: String,
    pub weather: String,
    pub wind: String,
    pub humidity: String,
    pub update_time: String,
}

/// Quote of the day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyQuoteData {
    pub content: String,
    pub author: String,
}

/// Local cache document for the daily feed. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_quote: Option<DailyQuoteData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_last_updated: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_quote_last_updated: Option<i64>,
}

/// Summary of what the daily cache currently holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyDataStatus {
    pub is_cached: bool,
    pub weather_cached: bool,
    pub daily_quote_cached: bool,
    pub weather_last_updated: Option<i64>,
    pub daily_quote_last_updated: Option<i64>,
}
