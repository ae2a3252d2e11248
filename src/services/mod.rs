// Armrest services
// Services provide the dashboard features: theme, daily feed, geocoding, site metadata, settings.

pub mod daily_cache;
pub mod geo_service;
pub mod http_client;
pub mod settings_engine;
pub mod theme_engine;
pub mod website_info;
