//! Armrest database layer.
//!
//! Provides SQLite connection management, schema migrations and the
//! key-value [`Storage`] that every accessor persists its document through.
//!
//! # Usage
//!
//! ```no_run
//! use armrest::database::Storage;
//! use armrest::types::storage::StorageArea;
//!
//! let storage = Storage::open("armrest.db").expect("failed to open storage");
//! let theme = storage.get(StorageArea::Sync, "armrest-theme-config").unwrap();
//! ```

pub mod connection;
pub mod migrations;
pub mod storage;

pub use connection::Database;
pub use storage::{ListenerId, Storage};
