//! Backing store engine
//!
//! [`StorageEngine`] is the narrow exec/query surface the settings manager
//! needs from an embedded key/value table. [`SqliteEngine`] implements it
//! on top of one SQLite file per [`StoreAddress`].
//!
//! Each call opens its own connection and drops it before returning, on
//! success and error paths alike. Only [`StorageEngine::initialize`] may
//! create a database file; every other call reports a missing file or table
//! as [`StorageError::StoreMissing`].

use std::time::Duration;

use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension};
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::schema::{has_settings_table, init_schema, SELECT_VALUE, UPSERT_VALUE};
use crate::router::StoreAddress;

/// Default time a connection waits on a locked database
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Key/value operations against one backing store
pub trait StorageEngine: Send + Sync {
    /// Read the raw value stored for `key`
    ///
    /// Returns `Ok(None)` when no row exists. A row whose value is NULL is
    /// also returned as `None`.
    fn read(&self, address: &StoreAddress, key: &str) -> StorageResult<Option<String>>;

    /// Insert or replace the row for `key`
    fn upsert(&self, address: &StoreAddress, key: &str, value: &str) -> StorageResult<()>;

    /// Create the store's table if it does not exist
    ///
    /// The directory is expected to exist already.
    fn initialize(&self, address: &StoreAddress) -> StorageResult<()>;
}

/// SQLite-backed engine, one database file per store
#[derive(Debug, Clone)]
pub struct SqliteEngine {
    busy_timeout: Duration,
}

impl Default for SqliteEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteEngine {
    /// Create an engine with the default busy timeout
    pub fn new() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Create an engine that waits up to `busy_timeout` on a locked database
    pub fn with_busy_timeout(busy_timeout: Duration) -> Self {
        Self { busy_timeout }
    }

    /// Open an existing, initialized store
    fn open_existing(&self, address: &StoreAddress) -> StorageResult<Connection> {
        let path = address.connection();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = match Connection::open_with_flags(path, flags) {
            Ok(conn) => conn,
            Err(e) if has_code(&e, ErrorCode::CannotOpen) => {
                return Err(StorageError::StoreMissing {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        conn.busy_timeout(self.busy_timeout)?;

        match has_settings_table(&conn) {
            Ok(true) => Ok(conn),
            Ok(false) => Err(StorageError::StoreMissing {
                path: path.to_path_buf(),
            }),
            Err(e) if has_code(&e, ErrorCode::NotADatabase) => Err(StorageError::StoreUnreadable {
                path: path.to_path_buf(),
                source: e,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

impl StorageEngine for SqliteEngine {
    fn read(&self, address: &StoreAddress, key: &str) -> StorageResult<Option<String>> {
        let conn = self.open_existing(address)?;
        let value: Option<Option<String>> = conn
            .query_row(SELECT_VALUE, [key], |row| row.get(0))
            .optional()?;
        Ok(value.flatten())
    }

    fn upsert(&self, address: &StoreAddress, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.open_existing(address)?;
        conn.execute(UPSERT_VALUE, params![key, value])?;
        Ok(())
    }

    fn initialize(&self, address: &StoreAddress) -> StorageResult<()> {
        let path = address.connection();
        debug!(path = %path.display(), "initializing settings table");

        let conn = Connection::open(path)?;
        conn.busy_timeout(self.busy_timeout)?;

        match init_schema(&conn) {
            Ok(()) => Ok(()),
            Err(e) if has_code(&e, ErrorCode::NotADatabase) => Err(StorageError::StoreUnreadable {
                path: path.to_path_buf(),
                source: e,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Check the primary SQLite result code of an error
fn has_code(error: &rusqlite::Error, code: ErrorCode) -> bool {
    matches!(error, rusqlite::Error::SqliteFailure(e, _) if e.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roots::FixedRoots;
    use crate::router::{StoreId, StoreRouter};
    use tempfile::TempDir;

    fn test_address(temp_dir: &TempDir) -> StoreAddress {
        let roots = FixedRoots::under(temp_dir.path());
        let router = StoreRouter::new("Acme", "Widget", "settings.db", &roots).unwrap();
        router.address(StoreId::RoamingUser).clone()
    }

    #[test]
    fn test_missing_file_is_store_missing() {
        let temp_dir = TempDir::new().unwrap();
        let address = test_address(&temp_dir);
        let engine = SqliteEngine::new();

        let err = engine.read(&address, "theme").unwrap_err();
        assert!(matches!(err, StorageError::StoreMissing { .. }));

        let err = engine.upsert(&address, "theme", "\"dark\"").unwrap_err();
        assert!(matches!(err, StorageError::StoreMissing { .. }));

        // Reads and writes never create the file
        assert!(!address.connection().exists());
    }

    #[test]
    fn test_empty_file_is_store_missing() {
        let temp_dir = TempDir::new().unwrap();
        let address = test_address(&temp_dir);
        std::fs::create_dir_all(address.directory()).unwrap();
        std::fs::write(address.connection(), b"").unwrap();

        let err = SqliteEngine::new().read(&address, "theme").unwrap_err();
        assert!(matches!(err, StorageError::StoreMissing { .. }));
    }

    #[test]
    fn test_garbage_file_is_store_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let address = test_address(&temp_dir);
        std::fs::create_dir_all(address.directory()).unwrap();
        std::fs::write(address.connection(), vec![0x5a; 4096]).unwrap();

        let err = SqliteEngine::new().read(&address, "theme").unwrap_err();
        assert!(matches!(err, StorageError::StoreUnreadable { .. }));
        assert!(err.is_store_missing());
    }

    #[test]
    fn test_initialize_then_read_write() {
        let temp_dir = TempDir::new().unwrap();
        let address = test_address(&temp_dir);
        std::fs::create_dir_all(address.directory()).unwrap();
        let engine = SqliteEngine::new();

        engine.initialize(&address).unwrap();
        assert_eq!(engine.read(&address, "theme").unwrap(), None);

        engine.upsert(&address, "theme", "\"dark\"").unwrap();
        engine.upsert(&address, "theme", "\"light\"").unwrap();
        assert_eq!(
            engine.read(&address, "theme").unwrap(),
            Some("\"light\"".to_string())
        );

        // Initializing again keeps existing rows
        engine.initialize(&address).unwrap();
        assert_eq!(
            engine.read(&address, "theme").unwrap(),
            Some("\"light\"".to_string())
        );
    }

    #[test]
    fn test_null_value_reads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let address = test_address(&temp_dir);
        std::fs::create_dir_all(address.directory()).unwrap();
        let engine = SqliteEngine::new();
        engine.initialize(&address).unwrap();

        let conn = Connection::open(address.connection()).unwrap();
        conn.execute(
            "INSERT INTO Settings (Key, Value) VALUES ('legacy', NULL)",
            [],
        )
        .unwrap();
        drop(conn);

        assert_eq!(engine.read(&address, "legacy").unwrap(), None);
    }
}
