//! Storage module for persisting indexing data
//!
//! This module handles all database operations for the indexer:
//! - SQLite database initialization and schema management
//! - Site record lookup, creation, status updates, and deletion
//! - Page persistence and bulk deletion by owning site

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::SiteStatus;
use crate::IndexerError;
use serde::Serialize;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared between the run task, the HTTP front end, and tests
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, IndexerError> {
    SqliteStorage::new(path)
}

/// Wraps a storage backend for sharing across tasks
pub fn shared<S: Storage + Send + 'static>(storage: S) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Locks a shared storage handle
///
/// A poisoned lock means a writer panicked mid-operation; callers get an
/// error instead of a panic.
pub fn lock(storage: &SharedStorage) -> StorageResult<MutexGuard<'_, dyn Storage + Send + 'static>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Represents a site in the database
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteRecord {
    pub id: i64,
    pub status: SiteStatus,
    /// RFC 3339 UTC timestamp of the last status change
    pub status_time: String,
    pub last_error: Option<String>,
    pub url: String,
    pub name: String,
}

/// Represents a page in the database
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}
