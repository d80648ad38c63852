//! SQLite schema for a settings store
//!
//! Every backing store holds exactly one table. The layout is a fixed
//! contract shared with any other program reading the same files:
//! no extra tables, indexes or columns.

use rusqlite::{Connection, Result};

/// Name of the single key/value table
pub const SETTINGS_TABLE: &str = "Settings";

/// Read one value by key
pub const SELECT_VALUE: &str = "SELECT Value FROM Settings WHERE Key = ?1";

/// Insert-or-replace one row
pub const UPSERT_VALUE: &str = "INSERT OR REPLACE INTO Settings (Key, Value) VALUES (?1, ?2)";

/// Initialize the settings table
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS Settings (
            Key TEXT PRIMARY KEY UNIQUE NOT NULL,
            Value TEXT
        );
        "#,
    )
}

/// Check if the settings table is present
pub fn has_settings_table(conn: &Connection) -> Result<bool> {
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1")?
        .exists([SETTINGS_TABLE])
}
