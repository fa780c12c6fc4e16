//! TOML-backed preference store.
//!
//! Writes go to a temp file first and are renamed into place, so a crash
//! mid-write can never leave a half-written preferences file. Reads fall
//! back to defaults when the file does not exist yet.

use std::path::PathBuf;

use crate::error::StoreError;

use super::{PrefStore, Prefs};

/// File-backed [`PrefStore`] at `<dir>/prefs.toml`.
pub struct TomlPrefStore {
    path: PathBuf,
}

impl TomlPrefStore {
    /// Open the store in the default data directory.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be created.
    pub fn open() -> Result<Self, StoreError> {
        let dir = super::data_dir().map_err(|e| StoreError::LoadFailed {
            path: PathBuf::from("~/.config/stridelock"),
            message: e.to_string(),
        })?;
        Ok(Self {
            path: dir.join("prefs.toml"),
        })
    }

    /// Open the store at an explicit path (used by tests and the CLI's
    /// `--prefs` override).
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl PrefStore for TomlPrefStore {
    fn load(&self) -> Result<Prefs, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Prefs::default());
            }
            Err(e) => {
                return Err(StoreError::LoadFailed {
                    path: self.path.clone(),
                    message: e.to_string(),
                });
            }
        };
        toml::from_str(&text).map_err(|e| StoreError::ParseFailed(e.to_string()))
    }

    fn save(&self, prefs: &Prefs) -> Result<(), StoreError> {
        let text = toml::to_string_pretty(prefs).map_err(|e| StoreError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, text).map_err(|e| StoreError::SaveFailed {
            path: tmp.clone(),
            message: e.to_string(),
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}
