//! Bookmark Manager for Armrest.
//!
//! Implements `BookmarkManagerTrait`: CRUD operations for folders and bookmarks,
//! JSON export and import. The whole bookmark tree is a single versioned JSON
//! document in the `sync` storage area; every operation reads it, applies the
//! change and writes the full document back.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::database::Storage;
use crate::types::bookmark::{
    Bookmark, BookmarkFolder, BookmarkPatch, BookmarkSearchHit, BookmarkState, FolderPatch,
    NewBookmark, BOOKMARK_SCHEMA_VERSION,
};
use crate::types::errors::BookmarkError;
use crate::types::storage::StorageArea;

/// Storage key of the bookmark document.
pub const BOOKMARKS_KEY: &str = "armrest_bookmarks";

/// Trait defining bookmark management operations.
///
/// Mutating operations return the document as persisted after the change.
pub trait BookmarkManagerTrait {
    fn get_bookmarks(&self) -> Result<BookmarkState, BookmarkError>;
    fn add_folder(&self, name: &str, icon: Option<&str>, color: Option<&str>) -> Result<BookmarkState, BookmarkError>;
    fn update_folder(&self, folder_id: &str, patch: FolderPatch) -> Result<BookmarkState, BookmarkError>;
    fn delete_folder(&self, folder_id: &str) -> Result<BookmarkState, BookmarkError>;
    fn add_bookmark(&self, folder_id: &str, data: NewBookmark) -> Result<BookmarkState, BookmarkError>;
    fn update_bookmark(&self, folder_id: &str, bookmark_id: &str, patch: BookmarkPatch) -> Result<BookmarkState, BookmarkError>;
    fn delete_bookmark(&self, folder_id: &str, bookmark_id: &str) -> Result<BookmarkState, BookmarkError>;
    fn move_bookmark(&self, from_folder_id: &str, to_folder_id: &str, bookmark_id: &str) -> Result<BookmarkState, BookmarkError>;
    /// Rewrites a folder's order. `ordered_ids` must be a permutation of its bookmark ids.
    fn reorder_bookmarks(&self, folder_id: &str, ordered_ids: &[String]) -> Result<BookmarkState, BookmarkError>;
    fn search_bookmarks(&self, query: &str) -> Result<Vec<BookmarkSearchHit>, BookmarkError>;
    fn export_bookmarks(&self) -> Result<String, BookmarkError>;
    fn import_bookmarks(&self, json: &str, merge: bool) -> Result<BookmarkState, BookmarkError>;
    fn clear_all_bookmarks(&self) -> Result<BookmarkState, BookmarkError>;
}

/// Bookmark manager persisting through the shared key-value [`Storage`].
pub struct BookmarkManager {
    storage: Arc<Storage>,
    write_lock: Mutex<()>,
}

/// Returns the current UNIX timestamp in milliseconds.
fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Stable-sorts a folder by stored order and reassigns `0..n-1`.
///
/// Returns true if any bookmark moved or got a new order value.
pub fn normalize_folder(folder: &mut BookmarkFolder) -> bool {
    let before: Vec<(String, usize)> = folder
        .bookmarks
        .iter()
        .map(|b| (b.id.clone(), b.order))
        .collect();
    folder.bookmarks.sort_by_key(|b| b.order);
    for (index, bookmark) in folder.bookmarks.iter_mut().enumerate() {
        bookmark.order = index;
    }
    folder
        .bookmarks
        .iter()
        .map(|b| (&b.id, b.order))
        .ne(before.iter().map(|(id, order)| (id, *order)))
}

/// Normalizes every folder. Returns true if anything changed.
pub fn normalize_state(state: &mut BookmarkState) -> bool {
    let mut changed = false;
    for folder in &mut state.folders {
        changed |= normalize_folder(folder);
    }
    changed
}

/// Reassigns order by current position, without sorting.
fn renumber(folder: &mut BookmarkFolder) {
    for (index, bookmark) in folder.bookmarks.iter_mut().enumerate() {
        bookmark.order = index;
    }
}

/// Builds the document a fresh profile starts with.
pub fn default_state() -> BookmarkState {
    let ts = now();
    let seed = [
        ("Work", "code", "#6366F1"),
        ("Tools", "wrench", "#10B981"),
        ("Design", "palette", "#EC4899"),
        ("Social", "users", "#F59E0B"),
    ];
    BookmarkState {
        version: BOOKMARK_SCHEMA_VERSION,
        folders: seed
            .iter()
            .map(|(name, icon, color)| BookmarkFolder {
                id: generate_id(),
                name: name.to_string(),
                icon: Some(icon.to_string()),
                color: Some(color.to_string()),
                bookmarks: Vec::new(),
                created_at: ts,
                updated_at: ts,
            })
            .collect(),
    }
}

/// Name of the export file for a given day, e.g. `armrest-bookmarks-2024-05-01.json`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("armrest-bookmarks-{}.json", date.format("%Y-%m-%d"))
}

impl BookmarkManager {
    /// Creates a new `BookmarkManager` over the shared storage.
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    fn save(&self, state: &BookmarkState) -> Result<(), BookmarkError> {
        self.storage.set_as(StorageArea::Sync, BOOKMARKS_KEY, state)?;
        Ok(())
    }

    fn reseed(&self) -> Result<BookmarkState, BookmarkError> {
        let state = default_state();
        self.save(&state)?;
        Ok(state)
    }

    /// Loads the document, seeding or normalizing it as needed. Callers hold `write_lock`.
    fn load(&self) -> Result<BookmarkState, BookmarkError> {
        let raw = match self.storage.get(StorageArea::Sync, BOOKMARKS_KEY)? {
            Some(raw) => raw,
            None => {
                info!("bookmarks: no document found, seeding defaults");
                return self.reseed();
            }
        };

        let version = raw.get("version").and_then(Value::as_u64);
        if version != Some(u64::from(BOOKMARK_SCHEMA_VERSION)) {
            info!("bookmarks: document version {:?} != {}, seeding defaults", version, BOOKMARK_SCHEMA_VERSION);
            return self.reseed();
        }

        let mut state: BookmarkState = match serde_json::from_value(raw) {
            Ok(state) => state,
            Err(e) => {
                warn!("bookmarks: stored document is unreadable ({}), seeding defaults", e);
                return self.reseed();
            }
        };

        if normalize_state(&mut state) {
            debug!("bookmarks: order indices normalized on read");
            self.save(&state)?;
        }
        Ok(state)
    }

    /// Runs one read-modify-write cycle. Nothing is written if `apply` fails.
    fn mutate<F>(&self, apply: F) -> Result<BookmarkState, BookmarkError>
    where
        F: FnOnce(&mut BookmarkState) -> Result<(), BookmarkError>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| BookmarkError::StorageError("bookmark lock poisoned".to_string()))?;
        let mut state = self.load()?;
        apply(&mut state)?;
        self.save(&state)?;
        Ok(state)
    }

    fn folder_mut<'s>(state: &'s mut BookmarkState, folder_id: &str) -> Result<&'s mut BookmarkFolder, BookmarkError> {
        state
            .folder_mut(folder_id)
            .ok_or_else(|| BookmarkError::FolderNotFound(folder_id.to_string()))
    }

    /// Parses an import payload, requiring a `folders` array.
    fn parse_import(json: &str) -> Result<BookmarkState, BookmarkError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| BookmarkError::InvalidImport(format!("not valid JSON: {}", e)))?;
        if !value.get("folders").map(Value::is_array).unwrap_or(false) {
            return Err(BookmarkError::InvalidImport("Invalid bookmark format".to_string()));
        }
        serde_json::from_value(value)
            .map_err(|e| BookmarkError::InvalidImport(format!("Invalid bookmark format: {}", e)))
    }

    /// Gives an imported bookmark a fresh identity.
    fn restamp(bookmark: &Bookmark, order: usize, ts: i64) -> Bookmark {
        Bookmark {
            id: generate_id(),
            order,
            created_at: ts,
            updated_at: ts,
            ..bookmark.clone()
        }
    }

    fn merge_into(current: &mut BookmarkState, imported: BookmarkState) {
        let ts = now();
        for mut folder in imported.folders {
            normalize_folder(&mut folder);
            match current.folders.iter_mut().find(|f| f.name == folder.name) {
                Some(existing) => {
                    let mut urls: HashSet<String> =
                        existing.bookmarks.iter().map(|b| b.url.clone()).collect();
                    let mut added = 0;
                    for bookmark in &folder.bookmarks {
                        if urls.insert(bookmark.url.clone()) {
                            let order = existing.bookmarks.len();
                            existing.bookmarks.push(Self::restamp(bookmark, order, ts));
                            added += 1;
                        }
                    }
                    existing.updated_at = ts;
                    debug!("bookmarks: merged {} new bookmark(s) into '{}'", added, existing.name);
                }
                None => {
                    let bookmarks = folder
                        .bookmarks
                        .iter()
                        .enumerate()
                        .map(|(i, b)| Self::restamp(b, i, ts))
                        .collect();
                    debug!("bookmarks: importing new folder '{}'", folder.name);
                    current.folders.push(BookmarkFolder {
                        id: generate_id(),
                        bookmarks,
                        created_at: ts,
                        updated_at: ts,
                        ..folder
                    });
                }
            }
        }
    }

    /// Fills identities an external document may lack.
    fn fill_missing(state: &mut BookmarkState) {
        let ts = now();
        for folder in &mut state.folders {
            if folder.id.is_empty() {
                folder.id = generate_id();
            }
            if folder.created_at == 0 {
                folder.created_at = ts;
            }
            if folder.updated_at == 0 {
                folder.updated_at = folder.created_at;
            }
            for bookmark in &mut folder.bookmarks {
                if bookmark.id.is_empty() {
                    bookmark.id = generate_id();
                }
                if bookmark.created_at == 0 {
                    bookmark.created_at = ts;
                }
                if bookmark.updated_at == 0 {
                    bookmark.updated_at = bookmark.created_at;
                }
            }
        }
    }
}

impl BookmarkManagerTrait for BookmarkManager {
    /// Returns the current document, seeding it on first use.
    fn get_bookmarks(&self) -> Result<BookmarkState, BookmarkError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| BookmarkError::StorageError("bookmark lock poisoned".to_string()))?;
        self.load()
    }

    fn add_folder(
        &self,
        name: &str,
        icon: Option<&str>,
        color: Option<&str>,
    ) -> Result<BookmarkState, BookmarkError> {
        self.mutate(|state| {
            let ts = now();
            state.folders.push(BookmarkFolder {
                id: generate_id(),
                name: name.to_string(),
                icon: icon.map(str::to_string),
                color: color.map(str::to_string),
                bookmarks: Vec::new(),
                created_at: ts,
                updated_at: ts,
            });
            Ok(())
        })
    }

    fn update_folder(&self, folder_id: &str, patch: FolderPatch) -> Result<BookmarkState, BookmarkError> {
        self.mutate(|state| {
            let folder = Self::folder_mut(state, folder_id)?;
            if let Some(name) = patch.name {
                folder.name = name;
            }
            if let Some(icon) = patch.icon {
                folder.icon = Some(icon);
            }
            if let Some(color) = patch.color {
                folder.color = Some(color);
            }
            folder.updated_at = now();
            Ok(())
        })
    }

    fn delete_folder(&self, folder_id: &str) -> Result<BookmarkState, BookmarkError> {
        self.mutate(|state| {
            let before = state.folders.len();
            state.folders.retain(|f| f.id != folder_id);
            if state.folders.len() == before {
                return Err(BookmarkError::FolderNotFound(folder_id.to_string()));
            }
            Ok(())
        })
    }

    /// Appends a bookmark at the end of the folder.
    fn add_bookmark(&self, folder_id: &str, data: NewBookmark) -> Result<BookmarkState, BookmarkError> {
        self.mutate(|state| {
            let folder = Self::folder_mut(state, folder_id)?;
            let ts = now();
            let order = folder.bookmarks.len();
            folder.bookmarks.push(Bookmark {
                id: generate_id(),
                name: data.name,
                url: data.url,
                description: data.description,
                logo: data.logo,
                color: data.color,
                order,
                created_at: ts,
                updated_at: ts,
            });
            folder.updated_at = ts;
            Ok(())
        })
    }

    fn update_bookmark(
        &self,
        folder_id: &str,
        bookmark_id: &str,
        patch: BookmarkPatch,
    ) -> Result<BookmarkState, BookmarkError> {
        self.mutate(|state| {
            let folder = Self::folder_mut(state, folder_id)?;
            let ts = now();
            let bookmark = folder
                .bookmarks
                .iter_mut()
                .find(|b| b.id == bookmark_id)
                .ok_or_else(|| BookmarkError::NotFound(bookmark_id.to_string()))?;
            if let Some(name) = patch.name {
                bookmark.name = name;
            }
            if let Some(url) = patch.url {
                bookmark.url = url;
            }
            if let Some(description) = patch.description {
                bookmark.description = description;
            }
            if let Some(logo) = patch.logo {
                bookmark.logo = logo;
            }
            if let Some(color) = patch.color {
                bookmark.color = color;
            }
            bookmark.updated_at = ts;
            folder.updated_at = ts;
            Ok(())
        })
    }

    /// Removes a bookmark and closes the gap it leaves in the folder's order.
    fn delete_bookmark(&self, folder_id: &str, bookmark_id: &str) -> Result<BookmarkState, BookmarkError> {
        self.mutate(|state| {
            let folder = Self::folder_mut(state, folder_id)?;
            let before = folder.bookmarks.len();
            folder.bookmarks.retain(|b| b.id != bookmark_id);
            if folder.bookmarks.len() == before {
                return Err(BookmarkError::NotFound(bookmark_id.to_string()));
            }
            renumber(folder);
            folder.updated_at = now();
            Ok(())
        })
    }

    fn move_bookmark(
        &self,
        from_folder_id: &str,
        to_folder_id: &str,
        bookmark_id: &str,
    ) -> Result<BookmarkState, BookmarkError> {
        self.mutate(|state| {
            if state.folder(to_folder_id).is_none() {
                return Err(BookmarkError::FolderNotFound(to_folder_id.to_string()));
            }
            let ts = now();
            let source = Self::folder_mut(state, from_folder_id)?;
            let index = source
                .bookmarks
                .iter()
                .position(|b| b.id == bookmark_id)
                .ok_or_else(|| BookmarkError::NotFound(bookmark_id.to_string()))?;
            let mut bookmark = source.bookmarks.remove(index);
            renumber(source);
            source.updated_at = ts;

            let destination = Self::folder_mut(state, to_folder_id)?;
            bookmark.order = destination.bookmarks.len();
            bookmark.updated_at = ts;
            destination.bookmarks.push(bookmark);
            renumber(destination);
            destination.updated_at = ts;
            Ok(())
        })
    }

    fn reorder_bookmarks(&self, folder_id: &str, ordered_ids: &[String]) -> Result<BookmarkState, BookmarkError> {
        self.mutate(|state| {
            let folder = Self::folder_mut(state, folder_id)?;
            if ordered_ids.len() != folder.bookmarks.len() {
                return Err(BookmarkError::InvalidReorder(format!(
                    "expected {} ids, got {}",
                    folder.bookmarks.len(),
                    ordered_ids.len()
                )));
            }
            let mut seen = HashSet::with_capacity(ordered_ids.len());
            for id in ordered_ids {
                if !seen.insert(id.as_str()) {
                    return Err(BookmarkError::InvalidReorder(format!("duplicate id {}", id)));
                }
                if !folder.bookmarks.iter().any(|b| &b.id == id) {
                    return Err(BookmarkError::NotFound(id.clone()));
                }
            }

            let mut remaining = std::mem::take(&mut folder.bookmarks);
            let mut reordered = Vec::with_capacity(remaining.len());
            for id in ordered_ids {
                if let Some(pos) = remaining.iter().position(|b| &b.id == id) {
                    reordered.push(remaining.swap_remove(pos));
                }
            }
            folder.bookmarks = reordered;
            renumber(folder);
            folder.updated_at = now();
            Ok(())
        })
    }

    /// Case-insensitive match on name, url and description across all folders.
    fn search_bookmarks(&self, query: &str) -> Result<Vec<BookmarkSearchHit>, BookmarkError> {
        let state = self.get_bookmarks()?;
        let needle = query.trim().to_lowercase();
        let mut hits = Vec::new();
        for folder in &state.folders {
            for bookmark in &folder.bookmarks {
                let matches = needle.is_empty()
                    || bookmark.name.to_lowercase().contains(&needle)
                    || bookmark.url.to_lowercase().contains(&needle)
                    || bookmark
                        .description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(&needle))
                        .unwrap_or(false);
                if matches {
                    hits.push(BookmarkSearchHit {
                        folder_id: folder.id.clone(),
                        folder_name: folder.name.clone(),
                        bookmark: bookmark.clone(),
                    });
                }
            }
        }
        Ok(hits)
    }

    /// Serializes the whole document as indented JSON.
    fn export_bookmarks(&self) -> Result<String, BookmarkError> {
        let state = self.get_bookmarks()?;
        serde_json::to_string_pretty(&state).map_err(|e| BookmarkError::StorageError(e.to_string()))
    }

    /// Replaces the document, or with `merge` unions folders by name and
    /// bookmarks by URL.
    fn import_bookmarks(&self, json: &str, merge: bool) -> Result<BookmarkState, BookmarkError> {
        let mut imported = Self::parse_import(json)?;

        if !merge {
            let _guard = self
                .write_lock
                .lock()
                .map_err(|_| BookmarkError::StorageError("bookmark lock poisoned".to_string()))?;
            imported.version = BOOKMARK_SCHEMA_VERSION;
            Self::fill_missing(&mut imported);
            normalize_state(&mut imported);
            self.save(&imported)?;
            info!("bookmarks: replaced document with {} imported folder(s)", imported.folders.len());
            return Ok(imported);
        }

        let state = self.mutate(|current| {
            Self::merge_into(current, imported);
            Ok(())
        })?;
        info!("bookmarks: merge import complete, {} folder(s)", state.folders.len());
        Ok(state)
    }

    /// Resets the document to the seeded default.
    fn clear_all_bookmarks(&self) -> Result<BookmarkState, BookmarkError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| BookmarkError::StorageError("bookmark lock poisoned".to_string()))?;
        self.reseed()
    }
}
