//! Database migrations
//!
//! Version 6 is the oldest schema still in the field; fresh databases are
//! created at 6 and then walked forward like any other install.
//!
//! 6 → 7 drops the inlined favicon payload and unused metadata columns from
//! `Site` and `Domain`. Favicons now live on disk and the tables only keep
//! their URL and size.

use crate::error::StorageError;
use crate::Result;
use rusqlite::Connection;

pub const SCHEMA_VERSION: i32 = 7;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: current_version,
            supported: SCHEMA_VERSION,
        });
    }

    if current_version < 6 {
        migrate_v6(conn)?;
        set_schema_version(conn, 6)?;
    }

    if current_version < 7 {
        migrate_6_to_7(conn)?;
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<i32, _> =
        conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        });

    match result {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(rusqlite::Error::SqliteFailure(_, _)) => {
            // Table doesn't exist yet
            conn.execute(
                "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
                [],
            )?;
            conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])?;
            Ok(0)
        }
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

fn migrate_v6(conn: &Connection) -> Result<()> {
    tracing::info!("Creating schema v6");

    // Sites and their visits. `Site` still carries the embedded metadata and
    // favicon columns at this version.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS Site (
            siteUID INTEGER PRIMARY KEY NOT NULL,
            siteURL TEXT NOT NULL,
            visitCount INTEGER NOT NULL DEFAULT 0,
            lastVisitTimestamp INTEGER NOT NULL,
            imageURL TEXT,
            title TEXT,
            description TEXT,
            entityType INTEGER,
            faviconURL TEXT,
            encodedImage TEXT,
            width INTEGER,
            height INTEGER
        );

        CREATE UNIQUE INDEX IF NOT EXISTS index_Site_siteURL ON Site(siteURL);

        CREATE TABLE IF NOT EXISTS Visit (
            visitUID INTEGER PRIMARY KEY NOT NULL,
            visitedSiteUID INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,
            FOREIGN KEY (visitedSiteUID) REFERENCES Site(siteUID) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS index_Visit_visitedSiteUID ON Visit(visitedSiteUID);
        CREATE INDEX IF NOT EXISTS index_Visit_timestamp ON Visit(timestamp);
    "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS Domain (
            domainUID INTEGER PRIMARY KEY NOT NULL,
            domainName TEXT NOT NULL,
            providerName TEXT,
            faviconURL TEXT,
            encodedImage TEXT,
            width INTEGER,
            height INTEGER
        );

        CREATE UNIQUE INDEX IF NOT EXISTS index_Domain_domainName ON Domain(domainName);
    "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS TabData (
            id TEXT PRIMARY KEY NOT NULL,
            url TEXT,
            title TEXT,
            lastActiveMs INTEGER NOT NULL,
            isArchived INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS index_TabData_isArchived ON TabData(isArchived);
    "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#,
    )?;

    Ok(())
}

fn migrate_6_to_7(conn: &Connection) -> Result<()> {
    tracing::info!("Running migration 6 -> 7: dropping inlined favicon columns");

    // Tables are rebuilt rather than altered so the surviving columns keep a
    // stable order. Foreign keys must be off while `Site` is swapped out or
    // dropping it would cascade into `Visit`.
    conn.pragma_update(None, "foreign_keys", "OFF")?;

    let rebuilt = conn.execute_batch(
        r#"
        BEGIN;

        CREATE TABLE Site_new (
            siteUID INTEGER PRIMARY KEY NOT NULL,
            siteURL TEXT NOT NULL,
            lastVisitTimestamp INTEGER NOT NULL,
            faviconURL TEXT,
            width INTEGER,
            height INTEGER,
            title TEXT
        );
        INSERT INTO Site_new (siteUID, siteURL, lastVisitTimestamp, faviconURL, width, height, title)
            SELECT siteUID, siteURL, lastVisitTimestamp, faviconURL, width, height, title FROM Site;
        DROP TABLE Site;
        ALTER TABLE Site_new RENAME TO Site;
        CREATE UNIQUE INDEX index_Site_siteURL ON Site(siteURL);

        CREATE TABLE Domain_new (
            domainUID INTEGER PRIMARY KEY NOT NULL,
            domainName TEXT NOT NULL,
            providerName TEXT,
            faviconURL TEXT,
            width INTEGER,
            height INTEGER
        );
        INSERT INTO Domain_new (domainUID, domainName, providerName, faviconURL, width, height)
            SELECT domainUID, domainName, providerName, faviconURL, width, height FROM Domain;
        DROP TABLE Domain;
        ALTER TABLE Domain_new RENAME TO Domain;
        CREATE UNIQUE INDEX index_Domain_domainName ON Domain(domainName);

        COMMIT;
    "#,
    );

    if let Err(e) = rebuilt {
        // Leave the v6 tables untouched if anything in the batch failed.
        let _ = conn.execute_batch("ROLLBACK;");
        conn.pragma_update(None, "foreign_keys", "ON")?;
        return Err(e.into());
    }

    conn.pragma_update(None, "foreign_keys", "ON")?;

    let violations: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_foreign_key_check",
        [],
        |row| row.get(0),
    )?;
    if violations > 0 {
        tracing::warn!(violations, "Foreign key violations after migration 6 -> 7");
    }

    Ok(())
}
