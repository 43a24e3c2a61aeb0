//! Favicons for the incognito profile
//!
//! Files are encrypted with a key that dies with the cache, and the only
//! record of which domain a file belongs to is an in-memory map keyed by
//! the domain hash. The directory is deleted when the profile closes, and
//! again at startup in case the process died before it could be.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

use crate::bitmap::Bitmap;
use crate::cache::{favicon_path, file_url, read_if_exists, FaviconCache, FaviconRecord};
use crate::domain::{domain_hash, DomainProvider};
use crate::encrypter::{ChaChaFileEncrypter, FileEncrypter};
use crate::Result;

pub struct IncognitoFaviconCache {
    directory: PathBuf,
    domains: Arc<dyn DomainProvider>,
    encrypter: Box<dyn FileEncrypter>,
    mapping: RwLock<HashMap<String, PathBuf>>,
}

impl IncognitoFaviconCache {
    pub fn new(directory: PathBuf, domains: Arc<dyn DomainProvider>) -> Self {
        Self::with_encrypter(directory, domains, Box::new(ChaChaFileEncrypter::generate()))
    }

    pub fn with_encrypter(
        directory: PathBuf,
        domains: Arc<dyn DomainProvider>,
        encrypter: Box<dyn FileEncrypter>,
    ) -> Self {
        Self {
            directory,
            domains,
            encrypter,
            mapping: RwLock::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Forgets every saved favicon. Files already written stay unreadable
    /// on disk until the directory is removed.
    pub fn clear_mapping(&self) {
        let mut mapping = self.mapping.write();
        let cleared = mapping.len();
        mapping.clear();
        tracing::debug!(cleared, "Cleared incognito favicon mapping");
    }

    pub fn len(&self) -> usize {
        self.mapping.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.read().is_empty()
    }

    /// Clears the mapping and deletes the cache directory.
    pub async fn destroy(&self) -> Result<()> {
        self.clear_mapping();
        Self::remove_directory(&self.directory).await
    }

    /// Deletes a directory left behind by an earlier incognito session.
    pub async fn remove_directory(directory: &Path) -> Result<()> {
        match tokio::fs::remove_dir_all(directory).await {
            Ok(()) => {
                tracing::info!(path = %directory.display(), "Removed incognito favicons");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn key_for(&self, site: &Url) -> Option<String> {
        self.domains
            .registered_domain(site)
            .map(|domain| domain_hash(&domain))
    }
}

#[async_trait]
impl FaviconCache for IncognitoFaviconCache {
    async fn save_favicon(&self, site: &Url, bitmap: &Bitmap) -> Result<Option<FaviconRecord>> {
        let Some(key) = self.key_for(site) else {
            return Ok(None);
        };

        tokio::fs::create_dir_all(&self.directory).await?;
        let path = favicon_path(&self.directory, bitmap);
        let sealed = self.encrypter.encrypt(bitmap.as_png())?;
        tokio::fs::write(&path, sealed).await?;
        let favicon_url = file_url(&path)?;

        self.mapping.write().insert(key, path);

        Ok(Some(FaviconRecord {
            favicon_url,
            width: bitmap.width(),
            height: bitmap.height(),
        }))
    }

    async fn get_favicon(&self, site: &Url) -> Result<Option<Bitmap>> {
        let Some(key) = self.key_for(site) else {
            return Ok(None);
        };
        let path = self.mapping.read().get(&key).cloned();
        let Some(path) = path else {
            return Ok(None);
        };

        match read_if_exists(&path).await? {
            Some(sealed) => {
                let png = self.encrypter.decrypt(&sealed)?;
                Ok(Some(Bitmap::decode(&png)?))
            }
            None => Ok(None),
        }
    }
}
