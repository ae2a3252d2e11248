//! Key-value storage areas with change notifications.
//!
//! Values are whole JSON documents replaced on every write. Listeners receive
//! the old and new value of each changed key after the write has committed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::connection::Database;
use crate::types::errors::StorageError;
use crate::types::storage::{StorageArea, StorageChange, StorageChanges};

/// Callback invoked after a key changes.
pub type StorageListener = Arc<dyn Fn(&StorageChanges, StorageArea) + Send + Sync>;

/// Handle returned by [`Storage::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// SQLite-backed key-value store shared by all accessors.
pub struct Storage {
    db: Mutex<Database>,
    listeners: Mutex<Vec<(ListenerId, StorageListener)>>,
    next_listener: AtomicU64,
}

impl Storage {
    pub fn new(db: Database) -> Self {
        Self {
            db: Mutex::new(db),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    /// Opens the store at `path`, creating the database file if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>, StorageError> {
        self.db.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    fn read(db: &Database, area: StorageArea, key: &str) -> Result<Option<Value>, StorageError> {
        let raw: Option<String> = db
            .connection()
            .query_row(
                "SELECT value FROM storage_items WHERE area = ?1 AND key = ?2",
                params![area.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Returns the raw JSON value stored under `key`, if any.
    pub fn get(&self, area: StorageArea, key: &str) -> Result<Option<Value>, StorageError> {
        let db = self.db()?;
        Self::read(&db, area, key)
    }

    /// Reads and decodes the document stored under `key`.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        area: StorageArea,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        match self.get(area, key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Replaces the value stored under `key`.
    pub fn set(&self, area: StorageArea, key: &str, value: Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(&value)?;
        let old = {
            let db = self.db()?;
            let old = Self::read(&db, area, key)?;
            db.connection().execute(
                "INSERT INTO storage_items (area, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(area, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![area.as_str(), key, text, Self::now()],
            )?;
            old
        };
        debug!("storage: wrote {}:{} ({} bytes)", area, key, text.len());
        if old.as_ref() != Some(&value) {
            self.notify(area, key, old, Some(value));
        }
        Ok(())
    }

    /// Serializes `value` and stores it under `key`.
    pub fn set_as<T: Serialize>(
        &self,
        area: StorageArea,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        self.set(area, key, serde_json::to_value(value)?)
    }

    /// Deletes `key`. Returns whether anything was removed.
    pub fn remove(&self, area: StorageArea, key: &str) -> Result<bool, StorageError> {
        let old = {
            let db = self.db()?;
            let old = Self::read(&db, area, key)?;
            db.connection().execute(
                "DELETE FROM storage_items WHERE area = ?1 AND key = ?2",
                params![area.as_str(), key],
            )?;
            old
        };
        let removed = old.is_some();
        if removed {
            debug!("storage: removed {}:{}", area, key);
            self.notify(area, key, old, None);
        }
        Ok(removed)
    }

    /// Lists the keys present in an area, sorted.
    pub fn keys(&self, area: StorageArea) -> Result<Vec<String>, StorageError> {
        let db = self.db()?;
        let mut stmt = db
            .connection()
            .prepare("SELECT key FROM storage_items WHERE area = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![area.as_str()], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    /// Registers a change listener for all areas.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&StorageChanges, StorageArea) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        match self.listeners.lock() {
            Ok(mut listeners) => listeners.push((id, Arc::new(listener))),
            Err(_) => warn!("storage: listener registry poisoned, listener {:?} dropped", id),
        }
        id
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        match self.listeners.lock() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|(lid, _)| *lid != id);
                listeners.len() != before
            }
            Err(_) => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    fn notify(&self, area: StorageArea, key: &str, old_value: Option<Value>, new_value: Option<Value>) {
        // Snapshot so listeners may (un)register without deadlocking.
        let listeners: Vec<StorageListener> = match self.listeners.lock() {
            Ok(l) => l.iter().map(|(_, f)| Arc::clone(f)).collect(),
            Err(_) => return,
        };
        if listeners.is_empty() {
            return;
        }
        let mut changes: StorageChanges = HashMap::new();
        changes.insert(key.to_string(), StorageChange { old_value, new_value });
        for listener in listeners {
            listener(&changes, area);
        }
    }
}
