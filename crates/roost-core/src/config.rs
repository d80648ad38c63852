//! Settings configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/roost/config.toml)
//! 3. Environment variables (ROOST_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::CacheCapacity;
use crate::error::{SettingsError, SettingsResult};
use crate::roots::{FixedRoots, RootResolver};

/// Environment variable prefix
const ENV_PREFIX: &str = "ROOST";

/// What `get` does when a key has no stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKeyPolicy {
    /// Return the supplied default, or the type's default value
    #[default]
    ReturnDefault,
    /// Fail with `SettingsError::NotFound`
    ThrowError,
}

impl FromStr for MissingKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "return_default" | "default" => Ok(MissingKeyPolicy::ReturnDefault),
            "throw_error" | "error" => Ok(MissingKeyPolicy::ThrowError),
            other => Err(format!("unknown missing-key policy '{}'", other)),
        }
    }
}

/// How `save` updates the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheWritePolicy {
    /// Every save replaces the cached value
    #[default]
    Refresh,
    /// Only the first save of a key reaches the cache; later saves update
    /// the store but leave the cached value alone
    FirstWriteWins,
}

/// Settings manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Organization or publisher directory name
    #[serde(default)]
    pub domain_name: String,

    /// Application directory name
    #[serde(default)]
    pub application_name: String,

    /// Database file name inside each store directory
    #[serde(default = "default_database_file")]
    pub database_file: String,

    #[serde(default)]
    pub missing_key: MissingKeyPolicy,

    #[serde(default)]
    pub cache_writes: CacheWritePolicy,

    /// Maximum cached entries (unbounded if unset)
    #[serde(default)]
    pub cache_capacity: Option<usize>,

    /// How long a write waits on a locked database
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Override for the roaming user root
    #[serde(default)]
    pub roaming_root: Option<PathBuf>,

    /// Override for the local user root
    #[serde(default)]
    pub local_root: Option<PathBuf>,

    /// Override for the shared application root
    #[serde(default)]
    pub application_root: Option<PathBuf>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            domain_name: String::new(),
            application_name: String::new(),
            database_file: default_database_file(),
            missing_key: MissingKeyPolicy::default(),
            cache_writes: CacheWritePolicy::default(),
            cache_capacity: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            roaming_root: None,
            local_root: None,
            application_root: None,
        }
    }
}

impl SettingsConfig {
    /// Configuration for one application's settings
    pub fn new(
        domain_name: impl Into<String>,
        application_name: impl Into<String>,
        database_file: impl Into<String>,
    ) -> Self {
        Self {
            domain_name: domain_name.into(),
            application_name: application_name.into(),
            database_file: database_file.into(),
            ..Self::default()
        }
    }

    /// Load configuration from default location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: SettingsConfig =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var(format!("{}_DOMAIN", ENV_PREFIX)) {
            self.domain_name = val;
        }

        if let Ok(val) = std::env::var(format!("{}_APPLICATION", ENV_PREFIX)) {
            self.application_name = val;
        }

        if let Ok(val) = std::env::var(format!("{}_DATABASE_FILE", ENV_PREFIX)) {
            self.database_file = val;
        }

        if let Ok(val) = std::env::var(format!("{}_MISSING_KEY", ENV_PREFIX)) {
            self.missing_key = val
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid {}_MISSING_KEY", ENV_PREFIX))?;
        }

        // Empty string clears a root override
        for (name, slot) in [
            ("ROAMING_ROOT", &mut self.roaming_root),
            ("LOCAL_ROOT", &mut self.local_root),
            ("APPLICATION_ROOT", &mut self.application_root),
        ] {
            if let Ok(val) = std::env::var(format!("{}_{}", ENV_PREFIX, name)) {
                *slot = if val.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(val))
                };
            }
        }

        Ok(())
    }

    /// Check the required names
    ///
    /// Each name becomes a single path segment, so it must be non-empty and
    /// free of separators.
    pub fn validate(&self) -> SettingsResult<()> {
        for (field, value) in [
            ("domain_name", &self.domain_name),
            ("application_name", &self.application_name),
            ("database_file", &self.database_file),
        ] {
            if value.trim().is_empty() {
                return Err(SettingsError::InvalidConfiguration(format!(
                    "{} is required",
                    field
                )));
            }
            if value == "." || value == ".." || value.contains(['/', '\\']) {
                return Err(SettingsError::InvalidConfiguration(format!(
                    "{} must be a single path segment, got '{}'",
                    field, value
                )));
            }
        }
        Ok(())
    }

    pub fn cache_capacity(&self) -> CacheCapacity {
        match self.cache_capacity {
            Some(max) => CacheCapacity::Bounded(max),
            None => CacheCapacity::Unbounded,
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Apply the root overrides on top of `base`
    pub fn resolve_roots(&self, base: &dyn RootResolver) -> SettingsResult<FixedRoots> {
        let roaming = match &self.roaming_root {
            Some(path) => path.clone(),
            None => base.roaming_root()?,
        };
        let local = match &self.local_root {
            Some(path) => path.clone(),
            None => base.local_root()?,
        };
        let application = match &self.application_root {
            Some(path) => path.clone(),
            None => base.application_root()?,
        };
        Ok(FixedRoots::new(roaming, local, application))
    }

    /// Get the config file path
    ///
    /// Can be overridden with ROOST_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roost")
            .join("config.toml")
    }
}

fn default_database_file() -> String {
    "settings.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}
