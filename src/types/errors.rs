use std::fmt;

// === StorageError ===

/// Errors raised by the key-value storage layer.
#[derive(Debug)]
pub enum StorageError {
    /// Database operation failed.
    DatabaseError(String),
    /// A stored value could not be encoded or decoded as JSON.
    SerializationError(String),
    /// The storage lock was poisoned by a panicking writer.
    LockPoisoned,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DatabaseError(msg) => write!(f, "Storage database error: {}", msg),
            StorageError::SerializationError(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
            StorageError::LockPoisoned => write!(f, "Storage lock poisoned"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}

// === BookmarkError ===

/// Errors related to bookmark management operations.
#[derive(Debug)]
pub enum BookmarkError {
    /// Bookmark with the given ID was not found.
    NotFound(String),
    /// The target folder was not found.
    FolderNotFound(String),
    /// The supplied id list is not a permutation of the folder's bookmarks.
    InvalidReorder(String),
    /// The import payload does not have the bookmark document shape.
    InvalidImport(String),
    /// Reading or writing the bookmark document failed.
    StorageError(String),
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkError::NotFound(id) => write!(f, "Bookmark not found: {}", id),
            BookmarkError::FolderNotFound(id) => write!(f, "Bookmark folder not found: {}", id),
            BookmarkError::InvalidReorder(msg) => write!(f, "Invalid bookmark order: {}", msg),
            BookmarkError::InvalidImport(msg) => {
                write!(f, "Failed to import bookmarks: {}", msg)
            }
            BookmarkError::StorageError(msg) => write!(f, "Bookmark storage error: {}", msg),
        }
    }
}

impl std::error::Error for BookmarkError {}

impl From<StorageError> for BookmarkError {
    fn from(e: StorageError) -> Self {
        BookmarkError::StorageError(e.to_string())
    }
}

// === ThemeError ===

/// Errors related to theme engine operations.
#[derive(Debug)]
pub enum ThemeError {
    /// The provided color value is invalid.
    InvalidColor(String),
    /// Reading or writing the theme document failed.
    StorageError(String),
}

impl fmt::Display for ThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeError::InvalidColor(color) => write!(f, "Invalid color: {}", color),
            ThemeError::StorageError(msg) => write!(f, "Theme storage error: {}", msg),
        }
    }
}

impl std::error::Error for ThemeError {}

impl From<StorageError> for ThemeError {
    fn from(e: StorageError) -> Self {
        ThemeError::StorageError(e.to_string())
    }
}

// === FetchError ===

/// Errors raised while talking to an external HTTP service.
#[derive(Debug)]
pub enum FetchError {
    /// The request could not be sent or the connection failed.
    NetworkError(String),
    /// The service answered with a non-success HTTP status.
    HttpStatus(u16),
    /// The response body was not the expected JSON shape.
    ParseError(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            FetchError::HttpStatus(code) => write!(f, "Unexpected HTTP status: {}", code),
            FetchError::ParseError(msg) => write!(f, "Response parse error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

// === GeoError ===

/// Errors related to reverse geocoding.
#[derive(Debug)]
pub enum GeoError {
    /// Latitude or longitude is out of range or not finite.
    InvalidCoordinates(String),
    /// The geocoding request failed.
    Fetch(FetchError),
    /// The response carried no usable place name.
    CityNotFound,
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::InvalidCoordinates(msg) => write!(f, "Invalid coordinates: {}", msg),
            GeoError::Fetch(e) => write!(f, "Reverse geocoding failed: {}", e),
            GeoError::CityNotFound => write!(f, "City name not found in response"),
        }
    }
}

impl std::error::Error for GeoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeoError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FetchError> for GeoError {
    fn from(e: FetchError) -> Self {
        GeoError::Fetch(e)
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
