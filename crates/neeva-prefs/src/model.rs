//! Shared preferences model

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::backend::PreferenceBackend;
use crate::folder::PrefFolder;
use crate::key::{PrefKey, PrefValue};
use crate::Result;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Emitted after a key is written or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefChange {
    pub folder: PrefFolder,
    pub key: String,
}

/// Typed access to preferences stored in a [`PreferenceBackend`].
#[derive(Clone)]
pub struct SharedPreferencesModel {
    backend: Arc<dyn PreferenceBackend>,
    changes: broadcast::Sender<PrefChange>,
}

impl SharedPreferencesModel {
    pub fn new(backend: Arc<dyn PreferenceBackend>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { backend, changes }
    }

    /// Reads `key`, returning its default when the value is missing,
    /// unreadable, or the backend fails.
    pub fn get<T: PrefValue>(&self, key: &PrefKey<T>) -> T {
        match self.backend.get(key.folder(), key.key()) {
            Ok(Some(raw)) => T::decode(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    folder = %key.folder(),
                    key = key.key(),
                    "Stored preference could not be decoded, using default"
                );
                key.default_value()
            }),
            Ok(None) => key.default_value(),
            Err(e) => {
                tracing::error!(
                    folder = %key.folder(),
                    key = key.key(),
                    error = %e,
                    "Failed to read preference"
                );
                key.default_value()
            }
        }
    }

    pub fn contains<T>(&self, key: &PrefKey<T>) -> bool {
        matches!(self.backend.get(key.folder(), key.key()), Ok(Some(_)))
    }

    pub fn set<T: PrefValue>(&self, key: &PrefKey<T>, value: &T) -> Result<()> {
        self.backend
            .set(key.folder(), key.key(), &value.encode())?;
        self.notify(key.folder(), key.key());
        Ok(())
    }

    pub fn remove<T>(&self, key: &PrefKey<T>) -> Result<()> {
        self.backend.remove(key.folder(), key.key())?;
        self.notify(key.folder(), key.key());
        Ok(())
    }

    /// Removes every key in `folder`, publishing a change for each.
    pub fn clear_folder(&self, folder: PrefFolder) -> Result<()> {
        let removed = self.backend.clear_folder(folder)?;
        tracing::info!(folder = %folder, removed = removed.len(), "Cleared preference folder");
        for key in &removed {
            self.notify(folder, key);
        }
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PrefChange> {
        self.changes.subscribe()
    }

    fn notify(&self, folder: PrefFolder, key: &str) {
        // No receivers is fine.
        let _ = self.changes.send(PrefChange {
            folder,
            key: key.to_string(),
        });
    }
}
