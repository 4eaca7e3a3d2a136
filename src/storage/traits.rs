//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::SiteStatus;
use crate::storage::{PageRecord, SiteRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Site not found: {0}")]
    SiteNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Each operation is individually atomic. The indexer does not rely on
/// cross-record transactions, only on the order in which it issues calls:
/// purge, then seed, then page writes, for any given site URL.
pub trait Storage {
    // ===== Site Management =====

    /// Finds the site record for a URL, if one exists
    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    /// Gets a site by ID
    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    /// Lists all site records ordered by ID
    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    /// Creates a site record with the given status and the current time
    ///
    /// # Returns
    ///
    /// The stored record, including its assigned ID
    fn create_site(&mut self, name: &str, url: &str, status: SiteStatus)
        -> StorageResult<SiteRecord>;

    /// Sets a site's status and last error, refreshing its status time
    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()>;

    /// Deletes a site record
    ///
    /// Pages should be removed first with [`Storage::delete_pages_by_site`].
    fn delete_site(&mut self, site_id: i64) -> StorageResult<()>;

    // ===== Page Management =====

    /// Stores one fetched page for a site
    ///
    /// # Returns
    ///
    /// The ID of the new page record
    fn save_page(&mut self, site_id: i64, path: &str, code: u16, content: &str)
        -> StorageResult<i64>;

    /// Deletes every page owned by a site
    ///
    /// # Returns
    ///
    /// The number of pages removed
    fn delete_pages_by_site(&mut self, site_id: i64) -> StorageResult<u64>;

    /// Gets all pages owned by a site, ordered by ID
    fn get_pages_by_site(&self, site_id: i64) -> StorageResult<Vec<PageRecord>>;

    // ===== Statistics =====

    /// Counts pages owned by a site
    fn count_pages_by_site(&self, site_id: i64) -> StorageResult<u64>;

    /// Gets total page count
    fn count_total_pages(&self) -> StorageResult<u64>;
}
