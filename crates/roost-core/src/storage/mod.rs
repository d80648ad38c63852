//! Storage layer
//!
//! Backing stores are SQLite files holding a single `Settings` table.
//!
//! ## Architecture
//!
//! - **engine**: exec/query surface used by the settings manager
//! - **schema**: the one-table layout and its SQL
//! - **error**: typed engine errors, including the "store missing" signal

pub mod engine;
pub mod error;
pub mod schema;

pub use engine::{SqliteEngine, StorageEngine, DEFAULT_BUSY_TIMEOUT};
pub use error::{StorageError, StorageResult};
pub use schema::{init_schema, SETTINGS_TABLE};
