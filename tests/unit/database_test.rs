//! Unit tests for the Armrest database layer (connection, migrations, key-value storage).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tempfile::TempDir;

use armrest::database::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use armrest::database::{Database, Storage};
use armrest::types::storage::StorageArea;

#[test]
fn test_open_in_memory_succeeds() {
    assert!(Database::open_in_memory().is_ok());
}

#[test]
fn test_migrations_create_storage_table() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let exists: bool = db
        .connection()
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='storage_items'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);
    assert!(exists, "storage_items should exist after migrations");
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_reopen_keeps_data_and_version() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("armrest.db");
    {
        let storage = Storage::open(&path).unwrap();
        storage.set(StorageArea::Sync, "k", json!({"a": 1})).unwrap();
    }
    let storage = Storage::open(&path).unwrap();
    assert_eq!(storage.get(StorageArea::Sync, "k").unwrap(), Some(json!({"a": 1})));

    let db = Database::open(&path).unwrap();
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_areas_are_isolated() {
    let storage = Storage::open_in_memory().unwrap();
    storage.set(StorageArea::Sync, "shared", json!("sync")).unwrap();
    storage.set(StorageArea::Local, "shared", json!("local")).unwrap();

    assert_eq!(storage.get(StorageArea::Sync, "shared").unwrap(), Some(json!("sync")));
    assert_eq!(storage.get(StorageArea::Local, "shared").unwrap(), Some(json!("local")));

    assert!(storage.remove(StorageArea::Local, "shared").unwrap());
    assert_eq!(storage.get(StorageArea::Local, "shared").unwrap(), None);
    assert!(storage.get(StorageArea::Sync, "shared").unwrap().is_some());
}

#[test]
fn test_keys_sorted_per_area() {
    let storage = Storage::open_in_memory().unwrap();
    storage.set(StorageArea::Sync, "b", json!(1)).unwrap();
    storage.set(StorageArea::Sync, "a", json!(2)).unwrap();
    storage.set(StorageArea::Local, "c", json!(3)).unwrap();
    assert_eq!(storage.keys(StorageArea::Sync).unwrap(), vec!["a", "b"]);
}

#[test]
fn test_listener_receives_old_and_new_value() {
    let storage = Storage::open_in_memory().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    storage.add_listener(move |changes, area| {
        for (key, change) in changes {
            sink.lock()
                .unwrap()
                .push((area, key.clone(), change.old_value.clone(), change.new_value.clone()));
        }
    });

    storage.set(StorageArea::Sync, "theme", json!(1)).unwrap();
    storage.set(StorageArea::Sync, "theme", json!(2)).unwrap();
    storage.remove(StorageArea::Sync, "theme").unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], (StorageArea::Sync, "theme".to_string(), None, Some(json!(1))));
    assert_eq!(seen[1].2, Some(json!(1)));
    assert_eq!(seen[1].3, Some(json!(2)));
    assert_eq!(seen[2].3, None);
}

#[test]
fn test_unchanged_write_and_missing_remove_do_not_notify() {
    let storage = Storage::open_in_memory().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    storage.add_listener(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    storage.set(StorageArea::Local, "k", json!("v")).unwrap();
    storage.set(StorageArea::Local, "k", json!("v")).unwrap();
    assert!(!storage.remove(StorageArea::Local, "missing").unwrap());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_removed_listener_stops_firing() {
    let storage = Storage::open_in_memory().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let id = storage.add_listener(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(storage.listener_count(), 1);

    assert!(storage.remove_listener(id));
    assert!(!storage.remove_listener(id));
    storage.set(StorageArea::Sync, "k", json!(true)).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(storage.listener_count(), 0);
}
