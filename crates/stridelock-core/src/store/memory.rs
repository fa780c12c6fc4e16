//! In-memory preference store for tests and simulations.

use std::sync::Mutex;

use crate::error::StoreError;

use super::{PrefStore, Prefs};

/// [`PrefStore`] that keeps everything behind a mutex, never touching disk.
#[derive(Default)]
pub struct MemoryPrefStore {
    prefs: Mutex<Prefs>,
}

impl MemoryPrefStore {
    pub fn new(prefs: Prefs) -> Self {
        Self {
            prefs: Mutex::new(prefs),
        }
    }
}

impl PrefStore for MemoryPrefStore {
    fn load(&self) -> Result<Prefs, StoreError> {
        Ok(self.prefs.lock().unwrap().clone())
    }

    fn save(&self, prefs: &Prefs) -> Result<(), StoreError> {
        *self.prefs.lock().unwrap() = prefs.clone();
        Ok(())
    }
}
