//! Tab record manager
//!
//! Keeps `TabData` rows and an in-memory copy of them in step.

use neeva_prefs::SharedPreferencesModel;
use neeva_storage::Database;
use parking_lot::RwLock;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::Arc;

use crate::archive::{ArchiveAfterOption, AUTOMATICALLY_ARCHIVE_TABS};
use crate::error::TabError;
use crate::tab::TabData;
use crate::Result;

pub struct TabDataManager {
    /// In-memory copy of every row
    tabs: Arc<RwLock<HashMap<String, TabData>>>,
    db: Database,
}

impl TabDataManager {
    /// Creates the manager and loads existing rows.
    pub fn new(db: Database) -> Result<Self> {
        let manager = Self {
            tabs: Arc::new(RwLock::new(HashMap::new())),
            db,
        };
        manager.reload()?;
        Ok(manager)
    }

    /// Re-reads every row from the database.
    pub fn reload(&self) -> Result<usize> {
        let tabs: Vec<TabData> = self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, url, title, lastActiveMs, isArchived FROM TabData",
            )?;
            let tabs = stmt
                .query_map([], |row| {
                    Ok(TabData {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        title: row.get(2)?,
                        last_active_ms: row.get(3)?,
                        is_archived: row.get(4)?,
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();
            Ok(tabs)
        })?;

        let mut cache = self.tabs.write();
        cache.clear();
        for tab in tabs {
            cache.insert(tab.id.clone(), tab);
        }
        Ok(cache.len())
    }

    pub fn create_tab(&self, url: Option<String>) -> Result<TabData> {
        let tab = TabData::new(url);
        self.add_or_update(&tab)?;

        tracing::info!(tab_id = %tab.id, "Created tab record");

        Ok(tab)
    }

    /// Inserts or replaces a record.
    pub fn add_or_update(&self, tab: &TabData) -> Result<()> {
        self.db.with_connection(|conn| {
            save_tab(conn, tab)?;
            Ok(())
        })?;
        self.tabs.write().insert(tab.id.clone(), tab.clone());
        Ok(())
    }

    pub fn get_tab(&self, tab_id: &str) -> Result<TabData> {
        self.tabs
            .read()
            .get(tab_id)
            .cloned()
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))
    }

    pub fn navigate_tab(&self, tab_id: &str, url: String) -> Result<TabData> {
        let mut tab = self.get_tab(tab_id)?;
        tab.navigate(url)?;
        self.add_or_update(&tab)?;
        Ok(tab)
    }

    pub fn set_tab_title(&self, tab_id: &str, title: String) -> Result<TabData> {
        let mut tab = self.get_tab(tab_id)?;
        tab.title = Some(title);
        self.add_or_update(&tab)?;
        Ok(tab)
    }

    /// Records that the tab was shown at `now_ms`.
    pub fn mark_active(&self, tab_id: &str, now_ms: i64) -> Result<TabData> {
        let mut tab = self.get_tab(tab_id)?;
        tab.last_active_ms = now_ms;
        self.add_or_update(&tab)?;
        Ok(tab)
    }

    pub fn archive_tab(&self, tab_id: &str) -> Result<TabData> {
        let mut tab = self.get_tab(tab_id)?;
        if !tab.is_archived {
            tab.is_archived = true;
            self.add_or_update(&tab)?;
            tracing::debug!(tab_id = %tab_id, "Archived tab");
        }
        Ok(tab)
    }

    pub fn unarchive_tab(&self, tab_id: &str) -> Result<TabData> {
        let mut tab = self.get_tab(tab_id)?;
        if tab.is_archived {
            tab.is_archived = false;
            self.add_or_update(&tab)?;
        }
        Ok(tab)
    }

    /// Removes the record of a tab that was closed.
    pub fn close_tab(&self, tab_id: &str) -> Result<()> {
        self.db.with_connection(|conn| {
            conn.execute("DELETE FROM TabData WHERE id = ?1", [tab_id])?;
            Ok(())
        })?;
        self.tabs.write().remove(tab_id);

        tracing::info!(tab_id = %tab_id, "Closed tab");

        Ok(())
    }

    /// Open tabs, most recently active first.
    pub fn active_tabs(&self) -> Vec<TabData> {
        self.sorted(|tab| !tab.is_archived)
    }

    /// Archived tabs, most recently active first.
    pub fn archived_tabs(&self) -> Vec<TabData> {
        self.sorted(|tab| tab.is_archived)
    }

    /// Archives every open tab that has been inactive for longer than
    /// `option` allows. Returns the ids that were archived.
    pub fn archive_inactive_tabs(
        &self,
        option: ArchiveAfterOption,
        now_ms: i64,
    ) -> Result<Vec<String>> {
        let Some(cutoff) = option.archive_cutoff_ms(now_ms) else {
            return Ok(Vec::new());
        };

        let stale: Vec<TabData> = self
            .tabs
            .read()
            .values()
            .filter(|tab| !tab.is_archived && tab.inactive_since(cutoff))
            .cloned()
            .collect();
        if stale.is_empty() {
            return Ok(Vec::new());
        }

        self.db.transaction(|conn| {
            for tab in &stale {
                conn.execute("UPDATE TabData SET isArchived = 1 WHERE id = ?1", [&tab.id])?;
            }
            Ok(())
        })?;

        let mut cache = self.tabs.write();
        let ids: Vec<String> = stale
            .into_iter()
            .map(|tab| {
                if let Some(cached) = cache.get_mut(&tab.id) {
                    cached.is_archived = true;
                }
                tab.id
            })
            .collect();

        tracing::info!(
            count = ids.len(),
            option = option.name(),
            "Archived inactive tabs"
        );

        Ok(ids)
    }

    /// Archives inactive tabs using the user's saved option.
    pub fn archive_inactive_tabs_with(
        &self,
        prefs: &SharedPreferencesModel,
        now_ms: i64,
    ) -> Result<Vec<String>> {
        self.archive_inactive_tabs(prefs.get(&AUTOMATICALLY_ARCHIVE_TABS), now_ms)
    }

    /// Deletes archived tabs last active before `cutoff_ms`.
    pub fn delete_archived_tabs_before(&self, cutoff_ms: i64) -> Result<usize> {
        let deleted = self.db.with_connection(|conn| {
            Ok(conn.execute(
                "DELETE FROM TabData WHERE isArchived = 1 AND lastActiveMs < ?1",
                [cutoff_ms],
            )?)
        })?;
        self.tabs
            .write()
            .retain(|_, tab| !(tab.is_archived && tab.inactive_since(cutoff_ms)));

        if deleted > 0 {
            tracing::info!(deleted, cutoff_ms, "Deleted expired archived tabs");
        }
        Ok(deleted)
    }

    pub fn delete_archived_tab(&self, tab_id: &str) -> Result<()> {
        if !self.get_tab(tab_id)?.is_archived {
            return Err(TabError::NotArchived(tab_id.to_string()));
        }
        self.close_tab(tab_id)
    }

    pub fn delete_all_archived_tabs(&self) -> Result<usize> {
        let deleted = self.db.with_connection(|conn| {
            Ok(conn.execute("DELETE FROM TabData WHERE isArchived = 1", [])?)
        })?;
        self.tabs.write().retain(|_, tab| !tab.is_archived);

        tracing::info!(deleted, "Deleted all archived tabs");
        Ok(deleted)
    }

    /// Removes an archived tab and returns the URL it should be reopened
    /// with. Tabs without a URL are left in the archive.
    pub fn restore_archived_tab(&self, tab_id: &str) -> Result<Option<String>> {
        let tab = self.get_tab(tab_id)?;
        if !tab.is_archived {
            return Err(TabError::NotArchived(tab_id.to_string()));
        }
        let Some(url) = tab.url else {
            return Ok(None);
        };

        self.close_tab(tab_id)?;
        Ok(Some(url))
    }

    fn sorted(&self, keep: impl Fn(&TabData) -> bool) -> Vec<TabData> {
        let mut tabs: Vec<TabData> = self
            .tabs
            .read()
            .values()
            .filter(|tab| keep(tab))
            .cloned()
            .collect();
        tabs.sort_by(|a, b| b.last_active_ms.cmp(&a.last_active_ms));
        tabs
    }
}

impl Clone for TabDataManager {
    fn clone(&self) -> Self {
        Self {
            tabs: Arc::clone(&self.tabs),
            db: self.db.clone(),
        }
    }
}

fn save_tab(conn: &Connection, tab: &TabData) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO TabData (id, url, title, lastActiveMs, isArchived)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            tab.id,
            tab.url,
            tab.title,
            tab.last_active_ms,
            tab.is_archived,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neeva_prefs::InMemoryPreferences;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn manager() -> TabDataManager {
        TabDataManager::new(Database::open_in_memory().unwrap()).unwrap()
    }

    fn tab_active_at(manager: &TabDataManager, url: &str, last_active_ms: i64) -> TabData {
        let tab = manager.create_tab(Some(url.to_string())).unwrap();
        manager.mark_active(&tab.id, last_active_ms).unwrap()
    }

    #[test]
    fn test_tab_lifecycle() {
        let manager = manager();

        let tab = manager
            .create_tab(Some("https://example.com".to_string()))
            .unwrap();
        let titled = manager.set_tab_title(&tab.id, "Example".to_string()).unwrap();
        assert_eq!(titled.display_title(), "Example");

        let navigated = manager
            .navigate_tab(&tab.id, "https://neeva.com".to_string())
            .unwrap();
        assert_eq!(navigated.url.as_deref(), Some("https://neeva.com"));
        assert!(navigated.title.is_none());

        manager.close_tab(&tab.id).unwrap();
        assert!(matches!(
            manager.get_tab(&tab.id),
            Err(TabError::NotFound(_))
        ));
    }

    #[test]
    fn test_records_survive_reload() {
        let db = Database::open_in_memory().unwrap();
        let first = TabDataManager::new(db.clone()).unwrap();
        let tab = first.create_tab(Some("https://example.com".to_string())).unwrap();
        first.archive_tab(&tab.id).unwrap();

        let second = TabDataManager::new(db).unwrap();
        let loaded = second.get_tab(&tab.id).unwrap();
        assert!(loaded.is_archived);
        assert_eq!(loaded.url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_archive_inactive_tabs() {
        let manager = manager();
        let now = 100 * DAY_MS;
        let fresh = tab_active_at(&manager, "https://fresh.com", now - DAY_MS / 2);
        let week_old = tab_active_at(&manager, "https://week.com", now - 8 * DAY_MS);
        let month_old = tab_active_at(&manager, "https://month.com", now - 31 * DAY_MS);

        assert!(manager
            .archive_inactive_tabs(ArchiveAfterOption::Never, now)
            .unwrap()
            .is_empty());

        let mut archived = manager
            .archive_inactive_tabs(ArchiveAfterOption::After7Days, now)
            .unwrap();
        archived.sort();
        let mut expected = vec![week_old.id.clone(), month_old.id.clone()];
        expected.sort();
        assert_eq!(archived, expected);

        let active: Vec<String> = manager.active_tabs().into_iter().map(|t| t.id).collect();
        assert_eq!(active, vec![fresh.id]);

        // Already archived tabs are not archived twice.
        assert!(manager
            .archive_inactive_tabs(ArchiveAfterOption::After1Day, now)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_archive_uses_saved_option() {
        let manager = manager();
        let prefs = SharedPreferencesModel::new(Arc::new(InMemoryPreferences::new()));
        let now = 100 * DAY_MS;
        tab_active_at(&manager, "https://two-days.com", now - 2 * DAY_MS);

        // Default is seven days.
        assert!(manager.archive_inactive_tabs_with(&prefs, now).unwrap().is_empty());

        prefs
            .set(&AUTOMATICALLY_ARCHIVE_TABS, &ArchiveAfterOption::After1Day)
            .unwrap();
        assert_eq!(manager.archive_inactive_tabs_with(&prefs, now).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_archived_tabs_before() {
        let manager = manager();
        let old = tab_active_at(&manager, "https://old.com", 10);
        let recent = tab_active_at(&manager, "https://recent.com", 1_000);
        let open_old = tab_active_at(&manager, "https://open.com", 5);
        manager.archive_tab(&old.id).unwrap();
        manager.archive_tab(&recent.id).unwrap();

        assert_eq!(manager.delete_archived_tabs_before(500).unwrap(), 1);

        assert!(manager.get_tab(&old.id).is_err());
        assert!(manager.get_tab(&recent.id).is_ok());
        // Open tabs are never expired.
        assert!(manager.get_tab(&open_old.id).is_ok());
    }

    #[test]
    fn test_restore_and_delete_archived() {
        let manager = manager();
        let tab = manager.create_tab(Some("https://example.com".to_string())).unwrap();

        assert!(matches!(
            manager.restore_archived_tab(&tab.id),
            Err(TabError::NotArchived(_))
        ));

        manager.archive_tab(&tab.id).unwrap();
        assert_eq!(manager.archived_tabs().len(), 1);
        assert_eq!(
            manager.restore_archived_tab(&tab.id).unwrap().as_deref(),
            Some("https://example.com")
        );
        assert!(manager.archived_tabs().is_empty());

        let a = manager.create_tab(None).unwrap();
        let b = manager.create_tab(Some("https://b.com".to_string())).unwrap();
        manager.archive_tab(&a.id).unwrap();
        manager.archive_tab(&b.id).unwrap();

        // Nothing to reopen without a URL.
        assert_eq!(manager.restore_archived_tab(&a.id).unwrap(), None);

        manager.delete_archived_tab(&b.id).unwrap();
        assert_eq!(manager.delete_all_archived_tabs().unwrap(), 1);
        assert!(manager.archived_tabs().is_empty());
    }
}
