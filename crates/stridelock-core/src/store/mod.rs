//! Persisted preference store.
//!
//! The rest of the core consumes preferences through the [`PrefStore`]
//! read/write contract only; the storage format is this module's business.
//! Two implementations are provided:
//!
//! - [`TomlPrefStore`]: TOML file under `~/.config/stridelock/`
//! - [`MemoryPrefStore`]: in-memory, for tests and simulations

mod memory;
mod prefs;
mod toml_store;

pub use memory::MemoryPrefStore;
pub use prefs::Prefs;
pub use toml_store::TomlPrefStore;

use std::path::PathBuf;

use crate::error::StoreError;

/// Read/write contract for persisted preferences.
///
/// Sensor callbacks write through this on every update, so implementations
/// must keep `save` fast and bounded -- no network, no database work.
pub trait PrefStore: Send + Sync {
    /// Load a snapshot of all preferences.
    fn load(&self) -> Result<Prefs, StoreError>;

    /// Persist all preferences. Must be durable before returning.
    fn save(&self, prefs: &Prefs) -> Result<(), StoreError>;
}

/// Returns `~/.config/stridelock[-dev]/` based on STRIDELOCK_ENV.
///
/// Set STRIDELOCK_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STRIDELOCK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("stridelock-dev")
    } else {
        base_dir.join("stridelock")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
