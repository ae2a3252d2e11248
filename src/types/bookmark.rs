use serde::{Deserialize, Deserializer, Serialize};

/// Current version of the persisted bookmark document.
pub const BOOKMARK_SCHEMA_VERSION: u32 = 1;

/// Sort key for bookmarks whose stored order is missing or not a number.
pub const UNORDERED: usize = usize::MAX;

/// Represents a saved bookmark.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default = "unordered", deserialize_with = "lenient_order")]
    pub order: usize,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Represents a folder for organizing bookmarks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkFolder {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// The root persisted bookmark document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookmarkState {
    #[serde(default)]
    pub version: u32,
    pub folders: Vec<BookmarkFolder>,
}

impl BookmarkState {
    pub fn folder(&self, folder_id: &str) -> Option<&BookmarkFolder> {
        self.folders.iter().find(|f| f.id == folder_id)
    }

    pub fn folder_mut(&mut self, folder_id: &str) -> Option<&mut BookmarkFolder> {
        self.folders.iter_mut().find(|f| f.id == folder_id)
    }
}

/// A bookmark matched by a quick-access search, with the folder it lives in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkSearchHit {
    pub folder_id: String,
    pub folder_name: String,
    pub bookmark: Bookmark,
}

/// Fields supplied by the caller when creating a bookmark.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewBookmark {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial update of a bookmark. `None` leaves the field untouched; for the
/// optional fields `Some(None)` (an explicit JSON `null`) clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookmarkPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub logo: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<String>>,
}

/// Partial update of a folder. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FolderPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// A folder icon the dashboard knows how to render.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct IconOption {
    pub id: &'static str,
    pub label: &'static str,
}

pub const ICON_OPTIONS: &[IconOption] = &[
    IconOption { id: "folder", label: "Folder" },
    IconOption { id: "code", label: "Code" },
    IconOption { id: "wrench", label: "Tools" },
    IconOption { id: "palette", label: "Design" },
    IconOption { id: "users", label: "Social" },
    IconOption { id: "bookmark", label: "Bookmark" },
    IconOption { id: "star", label: "Star" },
    IconOption { id: "sparkles", label: "AI" },
    IconOption { id: "home", label: "Home" },
    IconOption { id: "search", label: "Search" },
    IconOption { id: "heart", label: "Heart" },
    IconOption { id: "mail", label: "Mail" },
    IconOption { id: "calendar", label: "Calendar" },
    IconOption { id: "clock", label: "Clock" },
    IconOption { id: "link", label: "Link" },
    IconOption { id: "image", label: "Image" },
    IconOption { id: "music", label: "Music" },
    IconOption { id: "video", label: "Video" },
    IconOption { id: "file", label: "File" },
    IconOption { id: "settings", label: "Settings" },
    IconOption { id: "trash", label: "Trash" },
    IconOption { id: "edit", label: "Edit" },
    IconOption { id: "save", label: "Save" },
    IconOption { id: "share", label: "Share" },
];

/// Returns true if `id` names an entry of [`ICON_OPTIONS`].
pub fn is_known_icon(id: &str) -> bool {
    ICON_OPTIONS.iter().any(|icon| icon.id == id)
}

/// Marks a field that appeared in the input, even as `null`. Absent fields
/// never reach this and stay `None` through `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn unordered() -> usize {
    UNORDERED
}

/// Accepts any JSON value for `order`: integers are kept (negatives clamp to 0),
/// floats are truncated, anything else sorts last.
fn lenient_order<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let order = match value {
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                usize::try_from(u).unwrap_or(UNORDERED)
            } else if let Some(i) = n.as_i64() {
                if i < 0 { 0 } else { i as usize }
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f >= 0.0 => f as usize,
                    Some(f) if f.is_finite() => 0,
                    _ => UNORDERED,
                }
            }
        }
        _ => UNORDERED,
    };
    Ok(order)
}
