//! App Core for Armrest.
//!
//! Central struct holding the shared storage, settings and every manager/service.
//! Services read their endpoints and cache windows from the settings loaded at
//! construction; later settings changes apply on the next start.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use crate::database::Storage;
use crate::managers::bookmark_manager::BookmarkManager;
use crate::platform;
use crate::services::daily_cache::DailyCache;
use crate::services::geo_service::GeoService;
use crate::services::http_client::{HttpClient, JsonFetcher};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::theme_engine::{ThemeEngine, ThemeEngineTrait};
use crate::services::website_info::WebsiteInfoFetcher;
use crate::types::settings::DashboardSettings;

pub struct App {
    pub storage: Arc<Storage>,
    pub settings_engine: Mutex<SettingsEngine>,
    pub bookmarks: BookmarkManager,
    pub theme_engine: ThemeEngine,
    pub daily_cache: DailyCache,
    pub geo_service: GeoService,
    pub website_info: WebsiteInfoFetcher,
}

impl App {
    /// Opens the storage database under `data_dir` and loads settings from
    /// `settings_path` (or the platform config directory).
    ///
    /// A malformed settings file is reported and replaced by defaults in memory.
    pub fn new(data_dir: &Path, settings_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let db_path = platform::storage_db_path(data_dir);
        let storage = Arc::new(Storage::open(&db_path)?);
        info!("storage opened at {}", db_path.display());

        let mut settings_engine = SettingsEngine::new(settings_path);
        if let Err(e) = settings_engine.load() {
            warn!(
                "settings: {} unusable, continuing with defaults: {}",
                settings_engine.get_config_path(),
                e
            );
        }

        Ok(Self::with_parts(storage, settings_engine, Arc::new(HttpClient::new())))
    }

    /// Assembles an App from already-built parts. Used by tests to inject a fetcher.
    pub fn with_parts(
        storage: Arc<Storage>,
        settings_engine: SettingsEngine,
        fetcher: Arc<dyn JsonFetcher>,
    ) -> Self {
        let settings = settings_engine.get_settings().clone();
        Self {
            bookmarks: BookmarkManager::new(storage.clone()),
            theme_engine: ThemeEngine::new(storage.clone()),
            daily_cache: DailyCache::new(storage.clone(), fetcher.clone(), &settings.api, &settings.cache),
            geo_service: GeoService::new(fetcher.clone(), &settings.api, &settings.weather),
            website_info: WebsiteInfoFetcher::new(fetcher, &settings.api),
            settings_engine: Mutex::new(settings_engine),
            storage,
        }
    }

    /// Applies the stored theme mode so CSS variables reflect it.
    pub fn startup(&self) {
        let config = self.theme_engine.get_theme_config();
        let dark = self.theme_engine.apply_theme(config.mode);
        info!("startup: theme {:?} (dark = {})", config.mode, dark);
    }

    pub fn settings_engine(&self) -> Result<MutexGuard<'_, SettingsEngine>, String> {
        self.settings_engine
            .lock()
            .map_err(|_| "settings lock poisoned".to_string())
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> DashboardSettings {
        match self.settings_engine.lock() {
            Ok(engine) => engine.get_settings().clone(),
            Err(_) => DashboardSettings::default(),
        }
    }
}
