//! Storage error handling
//!
//! Typed errors returned by a [`StorageEngine`](super::StorageEngine).
//! The "store is missing" condition is a variant of its own so callers can
//! decide to provision without inspecting low-level error codes.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur inside a backing store
#[derive(Error, Debug)]
pub enum StorageError {
    /// The database file or its settings table does not exist
    #[error("Settings store '{path}' does not exist")]
    StoreMissing { path: PathBuf },

    /// The file exists but is not a readable settings database
    #[error("Settings store '{path}' is unreadable: {source}")]
    StoreUnreadable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to create the store directory
    #[error("Failed to create store directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error("Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again.")]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StorageError {
    /// Create an error from a directory-creation failure
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            _ if is_disk_full_error(&error) => StorageError::DiskFull {
                path,
                source: error,
            },
            _ => StorageError::CreateDirectory {
                path,
                source: error,
            },
        }
    }

    /// Whether provisioning the store could fix this error
    pub fn is_store_missing(&self) -> bool {
        matches!(
            self,
            StorageError::StoreMissing { .. } | StorageError::StoreUnreadable { .. }
        )
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
