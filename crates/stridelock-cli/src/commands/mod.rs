pub mod config;
pub mod emergency;
pub mod goal;
pub mod history;
pub mod lock;
pub mod status;

use stridelock_core::TomlPrefStore;

/// Open the preference store all commands share.
pub fn store() -> Result<TomlPrefStore, Box<dyn std::error::Error>> {
    Ok(TomlPrefStore::open()?)
}
