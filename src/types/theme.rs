use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_LIGHT_BACKGROUND: &str = "#FAFAFA";
pub const DEFAULT_DARK_BACKGROUND: &str = "#0d1117";

/// Theme mode selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl std::str::FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" => Ok(ThemeMode::System),
            other => Err(format!("unknown theme mode: {}", other)),
        }
    }
}

/// Background settings for one visual variant.
///
/// Stored variants are read through [`BackgroundPatch`] so a missing field takes
/// that variant's default rather than an empty string.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    pub background_color: String,
    pub background_image: String,
}

/// Field-level update of one variant. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundPatch {
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
}

impl Background {
    pub fn light() -> Self {
        Self {
            background_color: DEFAULT_LIGHT_BACKGROUND.to_string(),
            background_image: String::new(),
        }
    }

    pub fn dark() -> Self {
        Self {
            background_color: DEFAULT_DARK_BACKGROUND.to_string(),
            background_image: String::new(),
        }
    }

    pub fn apply(&mut self, patch: BackgroundPatch) {
        if let Some(color) = patch.background_color {
            self.background_color = color;
        }
        if let Some(image) = patch.background_image {
            self.background_image = image;
        }
    }

    fn patched(mut self, patch: BackgroundPatch) -> Self {
        self.apply(patch);
        self
    }
}

fn default_light() -> Background {
    Background::light()
}

fn default_dark() -> Background {
    Background::dark()
}

fn light_variant<'de, D>(deserializer: D) -> Result<Background, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Background::light().patched(BackgroundPatch::deserialize(deserializer)?))
}

fn dark_variant<'de, D>(deserializer: D) -> Result<Background, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Background::dark().patched(BackgroundPatch::deserialize(deserializer)?))
}

/// Persisted theme document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeConfig {
    #[serde(default)]
    pub mode: ThemeMode,
    #[serde(default = "default_light", deserialize_with = "light_variant")]
    pub light: Background,
    #[serde(default = "default_dark", deserialize_with = "dark_variant")]
    pub dark: Background,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            mode: ThemeMode::System,
            light: Background::light(),
            dark: Background::dark(),
        }
    }
}

impl ThemeConfig {
    pub fn variant(&self, dark: bool) -> &Background {
        if dark { &self.dark } else { &self.light }
    }

    pub fn variant_mut(&mut self, dark: bool) -> &mut Background {
        if dark { &mut self.dark } else { &mut self.light }
    }
}

/// Partial update of the theme document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ThemeConfigPatch {
    #[serde(default)]
    pub mode: Option<ThemeMode>,
    #[serde(default)]
    pub light: Option<BackgroundPatch>,
    #[serde(default)]
    pub dark: Option<BackgroundPatch>,
}

impl ThemeConfigPatch {
    /// Background colors the patch would write.
    pub fn colors(&self) -> impl Iterator<Item = &str> {
        [&self.light, &self.dark]
            .into_iter()
            .flatten()
            .filter_map(|variant| variant.background_color.as_deref())
    }
}
