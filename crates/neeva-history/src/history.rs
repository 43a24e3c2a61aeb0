//! History management

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::HistoryError;
use crate::Result;
use neeva_storage::Database;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub favicon_url: Option<String>,
    pub last_visited: DateTime<Utc>,
    pub visit_count: i64,
}

const ENTRY_COLUMNS: &str = "SELECT s.siteUID, s.siteURL, s.title, s.faviconURL,
            s.lastVisitTimestamp, COUNT(v.visitUID)
     FROM Site s LEFT JOIN Visit v ON v.visitedSiteUID = s.siteUID";

pub struct HistoryManager {
    db: Database,
}

impl HistoryManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record a visit to a URL now
    pub fn record_visit(&self, url: &str, title: Option<&str>) -> Result<i64> {
        self.record_visit_at(url, title, Utc::now())
    }

    /// Record a visit at a given time. Returns the site id.
    pub fn record_visit_at(
        &self,
        url: &str,
        title: Option<&str>,
        visited_at: DateTime<Utc>,
    ) -> Result<i64> {
        let url = Url::parse(url).map_err(|e| HistoryError::InvalidUrl(format!("{url}: {e}")))?;
        let timestamp = visited_at.timestamp_millis();

        let site_id = self.db.transaction(|conn| {
            conn.execute(
                "INSERT INTO Site (siteURL, lastVisitTimestamp, title) VALUES (?1, ?2, ?3)
                 ON CONFLICT(siteURL) DO UPDATE SET
                     lastVisitTimestamp = MAX(lastVisitTimestamp, excluded.lastVisitTimestamp),
                     title = COALESCE(NULLIF(excluded.title, ''), title)",
                params![url.as_str(), timestamp, title],
            )?;
            let site_id: i64 = conn.query_row(
                "SELECT siteUID FROM Site WHERE siteURL = ?1",
                [url.as_str()],
                |row| row.get(0),
            )?;
            conn.execute(
                "INSERT INTO Visit (visitedSiteUID, timestamp) VALUES (?1, ?2)",
                params![site_id, timestamp],
            )?;
            Ok(site_id)
        })?;

        tracing::debug!(site_id, url = %url, "Recorded visit");

        Ok(site_id)
    }

    /// Update the stored title for a URL without recording a visit.
    pub fn update_title(&self, url: &str, title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Ok(());
        }

        Ok(self.db.with_connection(|conn| {
            conn.execute(
                "UPDATE Site SET title = ?1 WHERE siteURL = ?2",
                params![title, url],
            )?;
            Ok(())
        })?)
    }

    pub fn get(&self, url: &str) -> Result<Option<HistoryEntry>> {
        Ok(self.db.with_connection(|conn| {
            let sql = format!("{ENTRY_COLUMNS} WHERE s.siteURL = ?1 GROUP BY s.siteUID");
            Ok(conn.query_row(&sql, [url], entry_from_row).optional()?)
        })?)
    }

    /// Search history by URL or title
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let pattern = format!("%{}%", query.to_lowercase());
        let sql = format!(
            "{ENTRY_COLUMNS}
             WHERE LOWER(s.siteURL) LIKE ?1 OR LOWER(COALESCE(s.title, '')) LIKE ?1
             GROUP BY s.siteUID
             ORDER BY s.lastVisitTimestamp DESC, COUNT(v.visitUID) DESC
             LIMIT ?2"
        );
        Ok(self.db.with_connection(|conn| {
            query_entries(conn, &sql, params![pattern, limit as i64])
        })?)
    }

    /// Get recent history entries
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let sql = format!(
            "{ENTRY_COLUMNS}
             GROUP BY s.siteUID
             ORDER BY s.lastVisitTimestamp DESC
             LIMIT ?1"
        );
        Ok(self
            .db
            .with_connection(|conn| query_entries(conn, &sql, params![limit as i64]))?)
    }

    /// Delete a site and its visits
    pub fn delete_site(&self, site_id: i64) -> Result<bool> {
        Ok(self.db.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM Site WHERE siteUID = ?1", [site_id])?;
            Ok(deleted > 0)
        })?)
    }

    /// Clear all history
    pub fn clear_all(&self) -> Result<usize> {
        let deleted = self
            .db
            .with_connection(|conn| Ok(conn.execute("DELETE FROM Site", [])?))?;

        tracing::info!(deleted, "Cleared history");
        Ok(deleted)
    }

    /// Clear visits within an optional time range (inclusive). Sites left
    /// without visits are removed; the rest keep their latest remaining
    /// visit time. Returns the number of visits removed.
    pub fn clear_range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<usize> {
        let start = start.map(|t| t.timestamp_millis()).unwrap_or(i64::MIN);
        let end = end.map(|t| t.timestamp_millis()).unwrap_or(i64::MAX);

        let deleted = self.db.transaction(|conn| {
            let deleted = conn.execute(
                "DELETE FROM Visit WHERE timestamp >= ?1 AND timestamp <= ?2",
                params![start, end],
            )?;
            conn.execute(
                "DELETE FROM Site
                 WHERE NOT EXISTS (SELECT 1 FROM Visit WHERE visitedSiteUID = Site.siteUID)",
                [],
            )?;
            conn.execute(
                "UPDATE Site SET lastVisitTimestamp =
                     (SELECT MAX(timestamp) FROM Visit WHERE visitedSiteUID = Site.siteUID)",
                [],
            )?;
            Ok(deleted)
        })?;

        tracing::info!(deleted, "Cleared history range");
        Ok(deleted)
    }
}

impl Clone for HistoryManager {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

fn query_entries(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> neeva_storage::Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(sql)?;
    let entries = stmt
        .query_map(params, entry_from_row)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(entries)
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let last_visited: i64 = row.get(4)?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        favicon_url: row.get(3)?,
        last_visited: DateTime::from_timestamp_millis(last_visited).unwrap_or_default(),
        visit_count: row.get(5)?,
    })
}
