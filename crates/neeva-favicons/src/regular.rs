//! Favicons for the regular profile

use async_trait::async_trait;
use neeva_storage::Database;
use rusqlite::{params, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

use crate::bitmap::Bitmap;
use crate::cache::{favicon_path, file_url, read_if_exists, url_path, FaviconCache, FaviconRecord};
use crate::domain::DomainProvider;
use crate::Result;

/// Writes favicon files to disk and records them in the `Domain` table.
#[derive(Clone)]
pub struct RegularFaviconCache {
    db: Database,
    directory: PathBuf,
    domains: Arc<dyn DomainProvider>,
}

impl RegularFaviconCache {
    pub fn new(db: Database, directory: PathBuf, domains: Arc<dyn DomainProvider>) -> Self {
        Self {
            db,
            directory,
            domains,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn stored_url(&self, domain: &str) -> Result<Option<String>> {
        let url = self.db.with_connection(|conn| {
            let url = conn
                .query_row(
                    "SELECT faviconURL FROM Domain WHERE domainName = ?1",
                    [domain],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()?;
            Ok(url.flatten())
        })?;
        Ok(url)
    }
}

#[async_trait]
impl FaviconCache for RegularFaviconCache {
    async fn save_favicon(&self, site: &Url, bitmap: &Bitmap) -> Result<Option<FaviconRecord>> {
        let Some(domain) = self.domains.registered_domain(site) else {
            return Ok(None);
        };

        tokio::fs::create_dir_all(&self.directory).await?;
        let path = favicon_path(&self.directory, bitmap);
        tokio::fs::write(&path, bitmap.as_png()).await?;
        let favicon_url = file_url(&path)?;

        let (width, height) = (bitmap.width(), bitmap.height());
        // A domain keeps the largest icon seen across its sites.
        self.db.transaction(|conn| {
            conn.execute(
                "INSERT INTO Domain (domainName, faviconURL, width, height) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(domainName) DO UPDATE SET
                     faviconURL = excluded.faviconURL,
                     width = excluded.width,
                     height = excluded.height
                 WHERE Domain.width IS NULL OR excluded.width >= Domain.width",
                params![domain, favicon_url.as_str(), width, height],
            )?;
            conn.execute(
                "UPDATE Site SET faviconURL = ?1, width = ?2, height = ?3 WHERE siteURL = ?4",
                params![favicon_url.as_str(), width, height, site.as_str()],
            )?;
            Ok(())
        })?;

        tracing::debug!(domain = %domain, path = %path.display(), "Saved favicon");

        Ok(Some(FaviconRecord {
            favicon_url,
            width,
            height,
        }))
    }

    async fn get_favicon(&self, site: &Url) -> Result<Option<Bitmap>> {
        let Some(domain) = self.domains.registered_domain(site) else {
            return Ok(None);
        };
        let Some(stored) = self.stored_url(&domain)? else {
            return Ok(None);
        };

        let path = match Url::parse(&stored) {
            Ok(url) => url_path(&url)?,
            Err(e) => {
                tracing::warn!(domain = %domain, error = %e, "Stored favicon URL is invalid");
                return Ok(None);
            }
        };

        match read_if_exists(&path).await? {
            Some(bytes) => Ok(Some(Bitmap::decode(&bytes)?)),
            None => Ok(None),
        }
    }
}
