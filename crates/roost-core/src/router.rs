//! Key routing
//!
//! A setting key may start with a 3-character prefix naming the store it
//! lives in:
//!
//! | Prefix | Store                    |
//! |--------|--------------------------|
//! | `@ru`  | [`StoreId::RoamingUser`] |
//! | `@lu`  | [`StoreId::LocalUser`]   |
//! | `@ap`  | [`StoreId::Application`] |
//!
//! Keys without a prefix go to the roaming store. Any key starting with `@`
//! loses its first three characters before reaching the store, even when
//! the prefix is not one of the above.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{SettingsError, SettingsResult};
use crate::roots::RootResolver;

/// Marker that starts a routing prefix
pub const PREFIX_MARKER: char = '@';

/// Length of a routing prefix, in characters
pub const PREFIX_LEN: usize = 3;

/// Logical store a key routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreId {
    /// Per-user, follows the user between machines
    #[default]
    RoamingUser,
    /// Per-user, this machine only
    LocalUser,
    /// Shared by all users of this machine
    Application,
}

impl StoreId {
    /// All stores, in routing table order
    pub const ALL: [StoreId; 3] = [StoreId::RoamingUser, StoreId::LocalUser, StoreId::Application];

    /// The key prefix selecting this store
    pub fn prefix(self) -> &'static str {
        match self {
            StoreId::RoamingUser => "@ru",
            StoreId::LocalUser => "@lu",
            StoreId::Application => "@ap",
        }
    }

    /// Look up the store for a 3-character prefix
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.prefix() == prefix)
    }

    fn index(self) -> usize {
        match self {
            StoreId::RoamingUser => 0,
            StoreId::LocalUser => 1,
            StoreId::Application => 2,
        }
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreId::RoamingUser => "roaming-user",
            StoreId::LocalUser => "local-user",
            StoreId::Application => "application",
        };
        f.write_str(name)
    }
}

/// Physical location of one backing store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreAddress {
    store: StoreId,
    directory: PathBuf,
    file_name: String,
    connection: PathBuf,
}

impl StoreAddress {
    fn new(store: StoreId, root: &Path, domain: &str, application: &str, file_name: &str) -> Self {
        let directory = root.join(domain).join(application);
        let connection = directory.join(file_name);
        Self {
            store,
            directory,
            file_name: file_name.to_string(),
            connection,
        }
    }

    pub fn store(&self) -> StoreId {
        self.store
    }

    /// Directory holding the database file
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Connection descriptor: the full path of the database file
    pub fn connection(&self) -> &Path {
        &self.connection
    }
}

/// Maps keys to store addresses
///
/// Addresses are computed once at construction and never change.
#[derive(Debug, Clone)]
pub struct StoreRouter {
    addresses: [StoreAddress; 3],
}

impl StoreRouter {
    /// Compute the three store addresses
    ///
    /// Each address directory is `<root>/<domain>/<application>`.
    pub fn new(
        domain: &str,
        application: &str,
        file_name: &str,
        roots: &dyn RootResolver,
    ) -> SettingsResult<Self> {
        let roaming = roots.roaming_root()?;
        let local = roots.local_root()?;
        let shared = roots.application_root()?;

        Ok(Self {
            addresses: [
                StoreAddress::new(StoreId::RoamingUser, &roaming, domain, application, file_name),
                StoreAddress::new(StoreId::LocalUser, &local, domain, application, file_name),
                StoreAddress::new(StoreId::Application, &shared, domain, application, file_name),
            ],
        })
    }

    /// Address of one store
    pub fn address(&self, store: StoreId) -> &StoreAddress {
        &self.addresses[store.index()]
    }

    /// All three addresses
    pub fn addresses(&self) -> &[StoreAddress] {
        &self.addresses
    }

    /// Resolve a key to its store address and stripped key
    pub fn resolve<'k>(&self, key: &'k str) -> SettingsResult<(&StoreAddress, &'k str)> {
        let (store, stripped) = split_key(key)?;
        Ok((self.address(store), stripped))
    }
}

/// Split a key into its store and the key stored in the table
pub fn split_key(key: &str) -> SettingsResult<(StoreId, &str)> {
    if key.is_empty() {
        return Err(invalid(key, "key is empty"));
    }
    if !key.starts_with(PREFIX_MARKER) {
        return Ok((StoreId::default(), key));
    }

    let prefix_end = match key.char_indices().nth(PREFIX_LEN) {
        Some((idx, _)) => idx,
        None if key.chars().count() == PREFIX_LEN => key.len(),
        None => return Err(invalid(key, "key starting with '@' is shorter than its prefix")),
    };

    let (prefix, stripped) = key.split_at(prefix_end);
    let store = StoreId::from_prefix(prefix).unwrap_or_default();
    Ok((store, stripped))
}

fn invalid(key: &str, reason: &'static str) -> SettingsError {
    SettingsError::InvalidKey {
        key: key.to_string(),
        reason,
    }
}
