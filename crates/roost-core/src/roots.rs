//! Storage roots
//!
//! The three directories the settings stores live under are provided by the
//! environment. [`SystemRoots`] asks the OS; [`FixedRoots`] pins them to
//! explicit paths.

use std::path::{Path, PathBuf};

use crate::error::{SettingsError, SettingsResult};

/// Source of the three storage root directories
pub trait RootResolver {
    /// Per-user data that follows the user between machines
    fn roaming_root(&self) -> SettingsResult<PathBuf>;

    /// Per-user data that stays on this machine
    fn local_root(&self) -> SettingsResult<PathBuf>;

    /// Machine-wide data shared by every user
    fn application_root(&self) -> SettingsResult<PathBuf>;
}

/// Roots reported by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRoots;

impl RootResolver for SystemRoots {
    fn roaming_root(&self) -> SettingsResult<PathBuf> {
        dirs::data_dir().ok_or_else(|| unresolved("roaming user data"))
    }

    fn local_root(&self) -> SettingsResult<PathBuf> {
        dirs::data_local_dir().ok_or_else(|| unresolved("local user data"))
    }

    fn application_root(&self) -> SettingsResult<PathBuf> {
        shared_data_dir().ok_or_else(|| unresolved("shared application data"))
    }
}

fn unresolved(what: &str) -> SettingsError {
    SettingsError::InvalidConfiguration(format!("cannot resolve the {} directory", what))
}

#[cfg(windows)]
fn shared_data_dir() -> Option<PathBuf> {
    std::env::var_os("ProgramData")
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from(r"C:\ProgramData")))
}

#[cfg(target_os = "macos")]
fn shared_data_dir() -> Option<PathBuf> {
    Some(PathBuf::from("/Library/Application Support"))
}

#[cfg(not(any(windows, target_os = "macos")))]
fn shared_data_dir() -> Option<PathBuf> {
    Some(PathBuf::from("/usr/share"))
}

/// Explicit root directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRoots {
    pub roaming: PathBuf,
    pub local: PathBuf,
    pub application: PathBuf,
}

impl FixedRoots {
    pub fn new(
        roaming: impl Into<PathBuf>,
        local: impl Into<PathBuf>,
        application: impl Into<PathBuf>,
    ) -> Self {
        Self {
            roaming: roaming.into(),
            local: local.into(),
            application: application.into(),
        }
    }

    /// `roaming/`, `local/` and `application/` under one base directory
    pub fn under(base: &Path) -> Self {
        Self::new(
            base.join("roaming"),
            base.join("local"),
            base.join("application"),
        )
    }
}

impl RootResolver for FixedRoots {
    fn roaming_root(&self) -> SettingsResult<PathBuf> {
        Ok(self.roaming.clone())
    }

    fn local_root(&self) -> SettingsResult<PathBuf> {
        Ok(self.local.clone())
    }

    fn application_root(&self) -> SettingsResult<PathBuf> {
        Ok(self.application.clone())
    }
}
