//! Store provisioning
//!
//! Creates a backing store on first use: the directory chain first, then
//! the settings table. Running it against a store that already exists
//! changes nothing.

use std::fs;

use tracing::info;

use crate::error::{SettingsError, SettingsResult};
use crate::router::StoreAddress;
use crate::storage::{StorageEngine, StorageError};

/// Creates missing backing stores
pub struct StoreProvisioner<'e, E: StorageEngine> {
    engine: &'e E,
}

impl<'e, E: StorageEngine> StoreProvisioner<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Make sure the store at `address` exists and has its table
    pub fn ensure(&self, address: &StoreAddress) -> SettingsResult<()> {
        let directory = address.directory();
        info!(
            store = %address.store(),
            path = %address.connection().display(),
            "provisioning settings store"
        );

        fs::create_dir_all(directory).map_err(|e| SettingsError::CreateFailed {
            path: directory.to_path_buf(),
            source: StorageError::from_io(e, directory.to_path_buf()),
        })?;

        self.engine
            .initialize(address)
            .map_err(|source| SettingsError::CreateFailed {
                path: address.connection().to_path_buf(),
                source,
            })
    }
}
