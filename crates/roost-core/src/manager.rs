//! Setting manager
//!
//! The public surface of the crate. A `SettingManager` routes each key to
//! one of three backing stores, creates a store the first time a save
//! reaches it, and keeps an in-memory cache of everything it saved or read.
//!
//! ## Reads
//!
//! A cached key is answered from memory without looking at the store.
//! Otherwise the store is queried; a missing row, a blank value, or a store
//! that does not exist yet all count as "no value" and are handled by the
//! configured [`MissingKeyPolicy`].
//!
//! ## Writes
//!
//! A save that finds its store missing provisions it and retries exactly
//! once. Any failure after that is reported as `PersistFailed`.
//!
//! ## Usage
//!
//! ```ignore
//! let settings = SettingManager::new(SettingsConfig::new("Acme", "Widget", "settings.db"))?;
//!
//! settings.save("@luWindowWidth", &1280u32)?;
//! let width: u32 = settings.get("@luWindowWidth")?;
//! let theme = settings.get_or("Theme", "light".to_string())?;
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CachedSetting, CachedValue, SettingCache};
use crate::codec::{Codec, JsonCodec};
use crate::config::{CacheWritePolicy, MissingKeyPolicy, SettingsConfig};
use crate::error::{SettingsError, SettingsResult};
use crate::provisioner::StoreProvisioner;
use crate::roots::{RootResolver, SystemRoots};
use crate::router::{StoreAddress, StoreId, StoreRouter};
use crate::storage::{SqliteEngine, StorageEngine, StorageError};

/// Prefix-routed settings store with an in-memory cache
///
/// Safe to share between threads. The cache lock is never held while a
/// backing store is being accessed. Separate managers, in this process or
/// another, do not coordinate with each other.
pub struct SettingManager<C: Codec = JsonCodec, E: StorageEngine = SqliteEngine> {
    router: StoreRouter,
    cache: SettingCache,
    codec: C,
    engine: E,
    missing_key: MissingKeyPolicy,
    cache_writes: CacheWritePolicy,
}

impl SettingManager {
    /// Open settings under the operating system's data directories
    pub fn new(config: SettingsConfig) -> SettingsResult<Self> {
        Self::with_roots(config, &SystemRoots)
    }

    /// Open settings under the given root directories
    ///
    /// Root overrides in `config` still take precedence over `roots`.
    pub fn with_roots(config: SettingsConfig, roots: &dyn RootResolver) -> SettingsResult<Self> {
        let engine = SqliteEngine::with_busy_timeout(config.busy_timeout());
        Self::with_parts(config, roots, JsonCodec, engine)
    }
}

impl<C: Codec, E: StorageEngine> SettingManager<C, E> {
    /// Build a manager from explicit collaborators
    pub fn with_parts(
        config: SettingsConfig,
        roots: &dyn RootResolver,
        codec: C,
        engine: E,
    ) -> SettingsResult<Self> {
        config.validate()?;

        let roots = config.resolve_roots(roots)?;
        let router = StoreRouter::new(
            &config.domain_name,
            &config.application_name,
            &config.database_file,
            &roots,
        )?;

        debug!(
            domain = %config.domain_name,
            application = %config.application_name,
            codec = codec.name(),
            "settings manager ready"
        );

        Ok(Self {
            router,
            cache: SettingCache::new(config.cache_capacity()),
            codec,
            engine,
            missing_key: config.missing_key,
            cache_writes: config.cache_writes,
        })
    }

    /// Persist a value under `key`
    ///
    /// Values that serialize to nil (`None`, `()`) are stored as an empty
    /// string and read back as "no value". The value must be owned (`String`,
    /// not `&str`) because a clone of it is kept in the cache.
    pub fn save<T>(&self, key: &str, value: &T) -> SettingsResult<()>
    where
        T: Serialize + Clone + Send + Sync + 'static,
    {
        let encoded = self
            .codec
            .encode(value)
            .map_err(|source| SettingsError::EncodeFailed {
                key: key.to_string(),
                source,
            })?;

        let (address, stripped) = self.router.resolve(key)?;
        debug!(key, store = %address.store(), "saving setting");
        self.persist(key, address, stripped, &encoded)?;

        let decoded: Option<CachedValue> = if encoded.is_empty() {
            None
        } else {
            Some(Arc::new(value.clone()))
        };
        let entry = CachedSetting::new(encoded, decoded);
        match self.cache_writes {
            CacheWritePolicy::Refresh => self.cache.insert(key, entry),
            CacheWritePolicy::FirstWriteWins => {
                self.cache.insert_if_absent(key, entry);
            }
        }

        Ok(())
    }

    /// Read the value stored under `key`
    ///
    /// When there is no value, returns `T::default()` or fails with
    /// `NotFound`, depending on the missing-key policy.
    pub fn get<T>(&self, key: &str) -> SettingsResult<T>
    where
        T: DeserializeOwned + Default + Clone + Send + Sync + 'static,
    {
        match self.lookup(key)? {
            Some(value) => Ok(value),
            None => self.on_missing(key, T::default),
        }
    }

    /// Read the value stored under `key`, falling back to `default`
    ///
    /// With [`MissingKeyPolicy::ThrowError`] a missing value still fails with
    /// `NotFound`.
    pub fn get_or<T>(&self, key: &str, default: T) -> SettingsResult<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        match self.lookup(key)? {
            Some(value) => Ok(value),
            None => self.on_missing(key, || default),
        }
    }

    /// Address of one of the three stores
    pub fn address(&self, store: StoreId) -> &StoreAddress {
        self.router.address(store)
    }

    pub fn router(&self) -> &StoreRouter {
        &self.router
    }

    pub fn missing_key_policy(&self) -> MissingKeyPolicy {
        self.missing_key
    }

    pub fn cache_write_policy(&self) -> CacheWritePolicy {
        self.cache_writes
    }

    /// Number of cached keys
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Forget every cached value
    ///
    /// Stored values are untouched; the next read of each key goes to its
    /// store.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Upsert, provisioning the store and retrying once if it is missing
    fn persist(
        &self,
        key: &str,
        address: &StoreAddress,
        stripped: &str,
        encoded: &str,
    ) -> SettingsResult<()> {
        let failed = |source: SettingsError| SettingsError::PersistFailed {
            key: key.to_string(),
            path: address.connection().to_path_buf(),
            source: Box::new(source),
        };

        match self.engine.upsert(address, stripped, encoded) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_store_missing() => {
                debug!(key, error = %e, "store not ready, provisioning");
            }
            Err(e) => return Err(failed(e.into())),
        }

        if let Err(e) = StoreProvisioner::new(&self.engine).ensure(address) {
            warn!(key, error = %e, "provisioning failed");
            return Err(failed(e));
        }

        self.engine
            .upsert(address, stripped, encoded)
            .map_err(|e| {
                warn!(key, error = %e, "save failed after provisioning");
                failed(e.into())
            })
    }

    /// Find the value for `key` in the cache or its store
    ///
    /// `None` means no usable value exists.
    fn lookup<T>(&self, key: &str) -> SettingsResult<Option<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let (address, stripped) = self.router.resolve(key)?;

        if let Some(hit) = self.cache.get(key) {
            if hit.is_blank() {
                return Ok(None);
            }
            if let Some(value) = hit.value_as::<T>() {
                return Ok(Some(value));
            }
            // Cached under another type
            return self.decode(key, hit.encoded()).map(Some);
        }

        let stored = match self.engine.read(address, stripped) {
            Ok(stored) => stored,
            Err(StorageError::StoreMissing { .. }) => {
                debug!(key, store = %address.store(), "store not created yet");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let text = match stored {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Ok(None),
        };

        let value: T = self.decode(key, &text)?;
        // A concurrent save may have cached a newer value meanwhile
        self.cache
            .insert_if_absent(key, CachedSetting::new(text, Some(Arc::new(value.clone()))));
        Ok(Some(value))
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, text: &str) -> SettingsResult<T> {
        self.codec
            .decode(text)
            .map_err(|source| SettingsError::DecodeFailed {
                key: key.to_string(),
                source,
            })
    }

    fn on_missing<T>(&self, key: &str, fallback: impl FnOnce() -> T) -> SettingsResult<T> {
        match self.missing_key {
            MissingKeyPolicy::ReturnDefault => Ok(fallback()),
            MissingKeyPolicy::ThrowError => {
                let (address, _) = self.router.resolve(key)?;
                Err(SettingsError::NotFound {
                    key: key.to_string(),
                    path: address.connection().to_path_buf(),
                })
            }
        }
    }
}
