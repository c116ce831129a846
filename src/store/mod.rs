//! SQLite-backed task store.
//!
//! The store hands out at most one open query cursor at a time. Every method
//! checks the cursor flag first, so a lookup issued from inside a
//! [`Store::for_each_top_level_task`] callback fails with
//! [`StoreError::CursorBusy`] instead of silently nesting queries.

mod projects;
mod tags;
mod tasks;
mod time;

use std::cell::Cell;
use std::path::Path;

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;
use tracing::debug;

use crate::model::INBOX_ID;

pub const SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store cursor already open; materialize results before issuing another query")]
    CursorBusy,
    #[error("the inbox project cannot be deleted")]
    InboxProtected,
    #[error("{0}")]
    Invalid(String),
    #[error("unsupported schema version {found}, max supported {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },
}

pub struct Store {
    conn: Connection,
    cursor_open: Cell<bool>,
}

/// Marks the store's single cursor as in use until dropped.
struct CursorGuard<'a>(&'a Cell<bool>);

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Invalid(format!("{}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        debug!(path = %path.display(), "opened task database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Store {
            conn,
            cursor_open: Cell::new(false),
        };
        store.migrate()?;
        Ok(store)
    }

    fn schema_version(&self) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    pub fn migrate(&self) -> Result<(), StoreError> {
        let current = self.schema_version()?;
        if current > SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchemaVersion {
                found: current,
                supported: SCHEMA_VERSION,
            });
        }

        if current < 1 {
            self.conn.execute_batch(include_str!("schema.sql"))?;
            let now = Utc::now();
            self.conn.execute(
                "INSERT OR IGNORE INTO projects (id, name, color, position, created_at, updated_at)
                 VALUES (?1, 'Inbox', '#61AFEF', 0, ?2, ?2)",
                rusqlite::params![INBOX_ID, now],
            )?;
            self.conn.execute("PRAGMA user_version = 1", [])?;
            debug!("migrated task database to schema 1");
        }

        Ok(())
    }

    /// Claim the single cursor for the duration of one query.
    fn open_cursor(&self) -> Result<CursorGuard<'_>, StoreError> {
        if self.cursor_open.replace(true) {
            return Err(StoreError::CursorBusy);
        }
        Ok(CursorGuard(&self.cursor_open))
    }
}

/// Wrap a bad enum value read from a row as a conversion error.
fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_has_inbox() {
        let store = Store::open_in_memory().unwrap();
        let projects = store.list_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert!(projects[0].is_inbox());
    }

    #[test]
    fn migrate_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store.migrate().unwrap();
        assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION);
        assert_eq!(store.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn open_creates_database_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tend.db");
        let store = Store::open(&path).unwrap();
        drop(store);
        assert!(path.exists());
    }
}
