//! Theme Engine: light/dark/system mode, per-mode backgrounds and CSS variables.
//!
//! The theme document lives in the `sync` storage area so that every open
//! dashboard can follow changes through [`ThemeEngineTrait::subscribe_to_theme_changes`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::{debug, warn};

use crate::database::{ListenerId, Storage};
use crate::types::errors::ThemeError;
use crate::types::storage::StorageArea;
use crate::types::theme::{Background, ThemeConfig, ThemeConfigPatch, ThemeMode};

/// Storage key of the theme document.
pub const THEME_KEY: &str = "armrest-theme-config";

/// Reports whether the host currently prefers a dark color scheme.
pub type PreferenceProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// Callback receiving the new theme document.
pub type ThemeCallback = Box<dyn Fn(ThemeConfig) + Send + Sync>;

/// Trait defining the theme engine interface.
pub trait ThemeEngineTrait {
    fn get_theme_config(&self) -> ThemeConfig;
    fn set_theme_config(&self, patch: ThemeConfigPatch) -> Result<ThemeConfig, ThemeError>;
    fn resolve_mode(&self, mode: ThemeMode) -> ThemeMode;
    fn get_current_background(&self) -> Background;
    fn set_background_color(&self, color: &str) -> Result<ThemeConfig, ThemeError>;
    fn set_background_image(&self, image: &str) -> Result<ThemeConfig, ThemeError>;
    fn apply_theme(&self, mode: ThemeMode) -> bool;
    fn is_dark_applied(&self) -> bool;
    fn css_variables(&self) -> HashMap<String, String>;
    fn subscribe_to_theme_changes(&self, callback: ThemeCallback) -> ThemeSubscription;
}

/// GitHub-style dark palette.
struct DarkPalette;
impl DarkPalette {
    const TEXT_PRIMARY: &'static str = "#c9d1d9";
    const TEXT_SECONDARY: &'static str = "#8b949e";
    const BORDER: &'static str = "#30363d";
    const SURFACE: &'static str = "#161b22";
    const ACCENT: &'static str = "#58a6ff";
}

/// GitHub-style light palette.
struct LightPalette;
impl LightPalette {
    const TEXT_PRIMARY: &'static str = "#24292f";
    const TEXT_SECONDARY: &'static str = "#57606a";
    const BORDER: &'static str = "#d0d7de";
    const SURFACE: &'static str = "#ffffff";
    const ACCENT: &'static str = "#0969da";
}

/// Validates a hex color string (e.g. "#2ea44f" or "#fff").
pub fn is_valid_hex_color(color: &str) -> bool {
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Default system preference probe.
///
/// `ARMREST_COLOR_SCHEME=dark|light` wins; otherwise a `GTK_THEME` containing
/// "dark" means dark. Anything else is light.
pub fn detect_system_prefers_dark() -> bool {
    if let Ok(scheme) = std::env::var("ARMREST_COLOR_SCHEME") {
        return scheme.eq_ignore_ascii_case("dark");
    }
    if let Ok(gtk_theme) = std::env::var("GTK_THEME") {
        return gtk_theme.to_lowercase().contains("dark");
    }
    false
}

/// Live registration of a theme change callback.
pub struct ThemeSubscription {
    storage: Weak<Storage>,
    id: ListenerId,
}

impl ThemeSubscription {
    /// Stops delivering changes. Returns false if the storage is gone or the
    /// listener was already removed.
    pub fn unsubscribe(self) -> bool {
        match self.storage.upgrade() {
            Some(storage) => storage.remove_listener(self.id),
            None => false,
        }
    }
}

/// The theme engine implementation.
pub struct ThemeEngine {
    storage: Arc<Storage>,
    prefers_dark: PreferenceProbe,
    dark_applied: AtomicBool,
    write_lock: Mutex<()>,
}

impl ThemeEngine {
    /// Creates a ThemeEngine using [`detect_system_prefers_dark`].
    pub fn new(storage: Arc<Storage>) -> Self {
        Self::with_preference_probe(storage, Arc::new(detect_system_prefers_dark))
    }

    pub fn with_preference_probe(storage: Arc<Storage>, prefers_dark: PreferenceProbe) -> Self {
        Self {
            storage,
            prefers_dark,
            dark_applied: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    fn effective_is_dark(&self, mode: ThemeMode) -> bool {
        self.resolve_mode(mode) == ThemeMode::Dark
    }

    /// Read-modify-write of the stored document under the engine's write lock.
    fn update<F>(&self, apply: F) -> Result<ThemeConfig, ThemeError>
    where
        F: FnOnce(&mut ThemeConfig, bool) -> Result<(), ThemeError>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ThemeError::StorageError("theme lock poisoned".to_string()))?;
        let mut config = self.get_theme_config();
        let dark = self.effective_is_dark(config.mode);
        apply(&mut config, dark)?;
        self.storage.set_as(StorageArea::Sync, THEME_KEY, &config)?;
        Ok(config)
    }
}

impl ThemeEngineTrait for ThemeEngine {
    /// Returns the stored config; missing fields and unreadable documents fall back to defaults.
    fn get_theme_config(&self) -> ThemeConfig {
        match self.storage.get_as::<ThemeConfig>(StorageArea::Sync, THEME_KEY) {
            Ok(Some(config)) => config,
            Ok(None) => ThemeConfig::default(),
            Err(e) => {
                warn!("theme: failed to read config, using defaults: {}", e);
                ThemeConfig::default()
            }
        }
    }

    /// Merges `patch` field by field. Any supplied background color must be valid hex.
    fn set_theme_config(&self, patch: ThemeConfigPatch) -> Result<ThemeConfig, ThemeError> {
        if let Some(bad) = patch.colors().find(|c| !is_valid_hex_color(c)) {
            return Err(ThemeError::InvalidColor(bad.to_string()));
        }
        self.update(|config, _| {
            if let Some(mode) = patch.mode {
                config.mode = mode;
            }
            if let Some(light) = patch.light {
                config.light.apply(light);
            }
            if let Some(dark) = patch.dark {
                config.dark.apply(dark);
            }
            Ok(())
        })
    }

    /// Resolves `System` to the host preference.
    fn resolve_mode(&self, mode: ThemeMode) -> ThemeMode {
        match mode {
            ThemeMode::System => {
                if (self.prefers_dark)() {
                    ThemeMode::Dark
                } else {
                    ThemeMode::Light
                }
            }
            other => other,
        }
    }

    fn get_current_background(&self) -> Background {
        let config = self.get_theme_config();
        let dark = self.effective_is_dark(config.mode);
        config.variant(dark).clone()
    }

    /// Writes into whichever variant is currently effective.
    fn set_background_color(&self, color: &str) -> Result<ThemeConfig, ThemeError> {
        if !is_valid_hex_color(color) {
            return Err(ThemeError::InvalidColor(color.to_string()));
        }
        self.update(|config, dark| {
            config.variant_mut(dark).background_color = color.to_string();
            Ok(())
        })
    }

    /// An empty string clears the image of the effective variant.
    fn set_background_image(&self, image: &str) -> Result<ThemeConfig, ThemeError> {
        self.update(|config, dark| {
            config.variant_mut(dark).background_image = image.to_string();
            Ok(())
        })
    }

    /// Sets the visual dark state from `mode`. Returns the resulting state.
    fn apply_theme(&self, mode: ThemeMode) -> bool {
        let dark = self.effective_is_dark(mode);
        self.dark_applied.store(dark, Ordering::SeqCst);
        debug!("theme: applied {:?} (dark = {})", mode, dark);
        dark
    }

    fn is_dark_applied(&self) -> bool {
        self.dark_applied.load(Ordering::SeqCst)
    }

    /// CSS custom properties for the applied state and its background.
    fn css_variables(&self) -> HashMap<String, String> {
        let dark = self.is_dark_applied();
        let config = self.get_theme_config();
        let background = config.variant(dark);

        let (text_primary, text_secondary, border, surface, accent) = if dark {
            (
                DarkPalette::TEXT_PRIMARY,
                DarkPalette::TEXT_SECONDARY,
                DarkPalette::BORDER,
                DarkPalette::SURFACE,
                DarkPalette::ACCENT,
            )
        } else {
            (
                LightPalette::TEXT_PRIMARY,
                LightPalette::TEXT_SECONDARY,
                LightPalette::BORDER,
                LightPalette::SURFACE,
                LightPalette::ACCENT,
            )
        };

        let image = if background.background_image.is_empty() {
            "none".to_string()
        } else {
            format!("url(\"{}\")", background.background_image)
        };

        let mut vars = HashMap::new();
        vars.insert("--background-color".into(), background.background_color.clone());
        vars.insert("--background-image".into(), image);
        vars.insert("--text-primary".into(), text_primary.into());
        vars.insert("--text-secondary".into(), text_secondary.into());
        vars.insert("--border-color".into(), border.into());
        vars.insert("--surface".into(), surface.into());
        vars.insert("--accent-color".into(), accent.into());
        vars.insert("--color-scheme".into(), if dark { "dark" } else { "light" }.into());
        vars
    }

    /// Invokes `callback` with the new config whenever the theme key changes in `sync`.
    fn subscribe_to_theme_changes(&self, callback: ThemeCallback) -> ThemeSubscription {
        let id = self.storage.add_listener(move |changes, area| {
            if area != StorageArea::Sync {
                return;
            }
            let Some(change) = changes.get(THEME_KEY) else {
                return;
            };
            let Some(new_value) = change.new_value.clone() else {
                return;
            };
            match serde_json::from_value::<ThemeConfig>(new_value) {
                Ok(config) => callback(config),
                Err(e) => warn!("theme: ignoring unreadable change notification: {}", e),
            }
        });
        ThemeSubscription {
            storage: Arc::downgrade(&self.storage),
            id,
        }
    }
}
