//! Where session token values live between launches

use neeva_prefs::{PrefKey, SharedPreferencesModel};
use parking_lot::RwLock;

use crate::Result;

/// Persistence for one token value. An empty string means no value.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> String;
    fn save(&self, value: &str) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// Keeps the value under a preference key.
pub struct PrefsTokenStore {
    prefs: SharedPreferencesModel,
    key: PrefKey<String>,
}

impl PrefsTokenStore {
    pub fn new(prefs: SharedPreferencesModel, key: PrefKey<String>) -> Self {
        Self { prefs, key }
    }
}

impl TokenStore for PrefsTokenStore {
    fn load(&self) -> String {
        self.prefs.get(&self.key)
    }

    fn save(&self, value: &str) -> Result<()> {
        self.prefs.set(&self.key, &value.to_string())?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.prefs.remove(&self.key)?;
        Ok(())
    }
}

/// Keeps the value only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    value: RwLock<String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> String {
        self.value.read().clone()
    }

    fn save(&self, value: &str) -> Result<()> {
        *self.value.write() = value.to_string();
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.value.write().clear();
        Ok(())
    }
}
