//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{PageRecord, SiteRecord};
use crate::IndexerError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SITE_COLUMNS: &str = "id, status, status_time, last_error, url, name";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(IndexerError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, IndexerError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, IndexerError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    let status_str: String = row.get(1)?;
    Ok(SiteRecord {
        id: row.get(0)?,
        status: SiteStatus::from_db_string(&status_str).unwrap_or(SiteStatus::Failed),
        status_time: row.get(2)?,
        last_error: row.get(3)?,
        url: row.get(4)?,
        name: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Site Management =====

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let sql = format!(
            "SELECT {} FROM site WHERE url = ?1 ORDER BY id DESC LIMIT 1",
            SITE_COLUMNS
        );
        let site = self
            .conn
            .query_row(&sql, params![url], site_from_row)
            .optional()?;
        Ok(site)
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        let sql = format!("SELECT {} FROM site WHERE id = ?1", SITE_COLUMNS);
        self.conn
            .query_row(&sql, params![site_id], site_from_row)
            .optional()?
            .ok_or(StorageError::SiteNotFound(site_id))
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let sql = format!("SELECT {} FROM site ORDER BY id", SITE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    fn create_site(
        &mut self,
        name: &str,
        url: &str,
        status: SiteStatus,
    ) -> StorageResult<SiteRecord> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO site (status, status_time, last_error, url, name) VALUES (?1, ?2, NULL, ?3, ?4)",
            params![status.to_db_string(), now, url, name],
        )?;

        Ok(SiteRecord {
            id: self.conn.last_insert_rowid(),
            status,
            status_time: now,
            last_error: None,
            url: url.to_string(),
            name: name.to_string(),
        })
    }

    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE site SET status = ?1, status_time = ?2, last_error = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, last_error, site_id],
        )?;

        if changed == 0 {
            return Err(StorageError::SiteNotFound(site_id));
        }
        Ok(())
    }

    fn delete_site(&mut self, site_id: i64) -> StorageResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM site WHERE id = ?1", params![site_id])?;

        if changed == 0 {
            return Err(StorageError::SiteNotFound(site_id));
        }
        Ok(())
    }

    // ===== Page Management =====

    fn save_page(
        &mut self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> StorageResult<i64> {
        self.conn
            .execute(
                "INSERT INTO page (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
                params![site_id, path, code, content],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StorageError::ConstraintViolation(format!(
                        "page {} references missing site {}",
                        path, site_id
                    ))
                }
                other => StorageError::Sqlite(other),
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    fn delete_pages_by_site(&mut self, site_id: i64) -> StorageResult<u64> {
        let removed = self
            .conn
            .execute("DELETE FROM page WHERE site_id = ?1", params![site_id])?;
        Ok(removed as u64)
    }

    fn get_pages_by_site(&self, site_id: i64) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, site_id, path, code, content FROM page WHERE site_id = ?1 ORDER BY id",
        )?;
        let pages = stmt
            .query_map(params![site_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    // ===== Statistics =====

    fn count_pages_by_site(&self, site_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM page WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM page", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
