//! Settings error types

use std::path::PathBuf;
use thiserror::Error;

use crate::codec::CodecError;
use crate::storage::StorageError;

/// Errors surfaced by the settings manager
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Constructor inputs are missing or unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Key cannot be routed to a store
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// Backing store could not be provisioned
    #[error("Failed to create settings store at '{path}': {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    /// A save could not complete, even after provisioning the store
    #[error("Failed to persist '{key}' to '{path}': {source}")]
    PersistFailed {
        key: String,
        path: PathBuf,
        #[source]
        source: Box<SettingsError>,
    },

    /// No value stored for the key
    #[error("Setting '{key}' not found in '{path}'")]
    NotFound { key: String, path: PathBuf },

    /// Value could not be encoded for storage
    #[error("Failed to encode '{key}': {source}")]
    EncodeFailed {
        key: String,
        #[source]
        source: CodecError,
    },

    /// Stored value could not be decoded into the requested type
    #[error("Failed to decode '{key}': {source}")]
    DecodeFailed {
        key: String,
        #[source]
        source: CodecError,
    },

    /// Unclassified backing store error
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SettingsError {
    /// Check if this error means the key has no stored value
    pub fn is_not_found(&self) -> bool {
        matches!(self, SettingsError::NotFound { .. })
    }
}

/// Result type for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;
