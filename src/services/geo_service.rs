//! Reverse geocoding of coordinates to a city name for the weather widget.

use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use crate::services::http_client::{build_url, JsonFetcher};
use crate::types::errors::GeoError;
use crate::types::settings::{ApiSettings, WeatherSettings};

const REVERSE_GEOCODE_PATH: &str = "/data/reverse-geocode-client";

pub struct GeoService {
    fetcher: Arc<dyn JsonFetcher>,
    base: String,
    language: String,
    fallback_city: String,
}

impl GeoService {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, api: &ApiSettings, weather: &WeatherSettings) -> Self {
        Self {
            fetcher,
            base: api.geocode_base.clone(),
            language: weather.locality_language.clone(),
            fallback_city: weather.fallback_city.clone(),
        }
    }

    /// Looks up the city at the given coordinates.
    pub async fn city_name_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<String, GeoError> {
        validate_coordinates(latitude, longitude)?;

        let lat = latitude.to_string();
        let lon = longitude.to_string();
        let url = build_url(
            &self.base,
            REVERSE_GEOCODE_PATH,
            &[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("localityLanguage", self.language.as_str()),
            ],
        )?;

        let body = self.fetcher.get_json(&url).await?;
        let city = pick_city_name(&body).ok_or(GeoError::CityNotFound)?;
        debug!("geo: ({}, {}) -> {}", latitude, longitude, city);
        Ok(city)
    }

    /// Picks the city to show weather for.
    ///
    /// An explicit non-empty city wins, then the geocoded one; any lookup error
    /// falls back to the configured fallback city.
    pub async fn resolve_city(&self, explicit: Option<&str>, coordinates: Option<(f64, f64)>) -> String {
        if let Some(city) = explicit.map(str::trim).filter(|c| !c.is_empty()) {
            return city.to_string();
        }
        if let Some((lat, lon)) = coordinates {
            match self.city_name_by_coordinates(lat, lon).await {
                Ok(city) => return city,
                Err(e) => warn!("geo: falling back to {}: {}", self.fallback_city, e),
            }
        }
        self.fallback_city.clone()
    }
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), GeoError> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(GeoError::InvalidCoordinates(
            "latitude and longitude must be finite numbers".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(GeoError::InvalidCoordinates(format!(
            "latitude {} is outside [-90, 90]",
            latitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(GeoError::InvalidCoordinates(format!(
            "longitude {} is outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}

/// city → locality → principalSubdivision → countryName, skipping empty values.
pub fn pick_city_name(body: &Value) -> Option<String> {
    ["city", "locality", "principalSubdivision", "countryName"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
}
