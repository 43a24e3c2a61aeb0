//! Preference storage backends

use parking_lot::RwLock;
use std::collections::HashMap;

use neeva_storage::Database;

use crate::folder::PrefFolder;
use crate::Result;

/// Raw string storage underneath [`crate::SharedPreferencesModel`].
pub trait PreferenceBackend: Send + Sync {
    fn get(&self, folder: PrefFolder, key: &str) -> Result<Option<String>>;
    fn set(&self, folder: PrefFolder, key: &str, value: &str) -> Result<()>;
    fn remove(&self, folder: PrefFolder, key: &str) -> Result<()>;
    /// Removes every key in `folder` and returns the removed key names.
    fn clear_folder(&self, folder: PrefFolder) -> Result<Vec<String>>;
}

/// Stores preferences in the `settings` table as `FOLDER/KEY` rows.
#[derive(Clone)]
pub struct DatabasePreferences {
    db: Database,
}

impl DatabasePreferences {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl PreferenceBackend for DatabasePreferences {
    fn get(&self, folder: PrefFolder, key: &str) -> Result<Option<String>> {
        Ok(self.db.get_setting(&folder.storage_key(key))?)
    }

    fn set(&self, folder: PrefFolder, key: &str, value: &str) -> Result<()> {
        Ok(self.db.set_setting(&folder.storage_key(key), value)?)
    }

    fn remove(&self, folder: PrefFolder, key: &str) -> Result<()> {
        self.db.remove_setting(&folder.storage_key(key))?;
        Ok(())
    }

    fn clear_folder(&self, folder: PrefFolder) -> Result<Vec<String>> {
        let prefix = folder.storage_key("");
        let mut removed = Vec::new();
        for (key, _) in self.db.settings_with_prefix(&prefix)? {
            self.db.remove_setting(&key)?;
            removed.push(key[prefix.len()..].to_string());
        }
        Ok(removed)
    }
}

/// Process-lifetime storage, used by tests and throwaway profiles.
#[derive(Default)]
pub struct InMemoryPreferences {
    values: RwLock<HashMap<(PrefFolder, String), String>>,
}

impl InMemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceBackend for InMemoryPreferences {
    fn get(&self, folder: PrefFolder, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(&(folder, key.to_string())).cloned())
    }

    fn set(&self, folder: PrefFolder, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .insert((folder, key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, folder: PrefFolder, key: &str) -> Result<()> {
        self.values.write().remove(&(folder, key.to_string()));
        Ok(())
    }

    fn clear_folder(&self, folder: PrefFolder) -> Result<Vec<String>> {
        let mut values = self.values.write();
        let mut removed: Vec<String> = values
            .keys()
            .filter(|(f, _)| *f == folder)
            .map(|(_, key)| key.clone())
            .collect();
        values.retain(|(f, _), _| *f != folder);
        removed.sort();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_backend_folders_are_isolated() {
        let backend = DatabasePreferences::new(Database::open_in_memory().unwrap());
        backend.set(PrefFolder::User, "TOKEN", "abc").unwrap();
        backend.set(PrefFolder::App, "TOKEN", "other").unwrap();

        assert_eq!(backend.clear_folder(PrefFolder::User).unwrap(), vec!["TOKEN"]);

        assert_eq!(backend.get(PrefFolder::User, "TOKEN").unwrap(), None);
        assert_eq!(
            backend.get(PrefFolder::App, "TOKEN").unwrap().as_deref(),
            Some("other")
        );
    }

    #[test]
    fn test_in_memory_backend() {
        let backend = InMemoryPreferences::new();
        backend.set(PrefFolder::FirstRun, "NUM_PREVIEW_QUERIES", "3").unwrap();
        assert_eq!(
            backend
                .get(PrefFolder::FirstRun, "NUM_PREVIEW_QUERIES")
                .unwrap()
                .as_deref(),
            Some("3")
        );
        backend.remove(PrefFolder::FirstRun, "NUM_PREVIEW_QUERIES").unwrap();
        assert_eq!(backend.get(PrefFolder::FirstRun, "NUM_PREVIEW_QUERIES").unwrap(), None);
    }
}
