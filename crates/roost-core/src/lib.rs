//! Roost Core Library
//!
//! An embeddable settings store that persists serializable values across
//! process restarts. Each key is routed by its prefix to one of three
//! SQLite-backed stores:
//!
//! - `@ru` (or no prefix): roaming user data
//! - `@lu`: local user data
//! - `@ap`: machine-wide application data
//!
//! Stores are created the first time a value is saved to them.
//!
//! # Quick Start
//!
//! ```text
//! let settings = SettingManager::new(SettingsConfig::new("Acme", "Widget", "settings.db"))?;
//!
//! settings.save("@apLicenseServer", &"https://license.example.com".to_string())?;
//! let server: String = settings.get("@apLicenseServer")?;
//! let zoom = settings.get_or("@luZoom", 100u32)?;
//! ```
//!
//! # Modules
//!
//! - `manager`: Cached get/save (main entry point)
//! - `router`: Key prefixes and store addresses
//! - `provisioner`: On-demand store creation
//! - `storage`: SQLite engine and schema
//! - `cache`: In-memory setting cache
//! - `codec`: Value encodings (JSON, CBOR)
//! - `roots`: Storage root directories
//! - `config`: Manager configuration

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod manager;
pub mod provisioner;
pub mod roots;
pub mod router;
pub mod storage;

pub use cache::{CacheCapacity, SettingCache};
pub use codec::{CborCodec, Codec, CodecError, JsonCodec};
pub use config::{CacheWritePolicy, MissingKeyPolicy, SettingsConfig};
pub use error::{SettingsError, SettingsResult};
pub use manager::SettingManager;
pub use provisioner::StoreProvisioner;
pub use roots::{FixedRoots, RootResolver, SystemRoots};
pub use router::{StoreAddress, StoreId, StoreRouter};
pub use storage::{SqliteEngine, StorageEngine, StorageError};
