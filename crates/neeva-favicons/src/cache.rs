//! Shared favicon cache contract

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

use crate::bitmap::Bitmap;
use crate::error::FaviconError;
use crate::Result;

/// Where a saved favicon ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaviconRecord {
    /// `file://` URL of the written image.
    pub favicon_url: Url,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait FaviconCache: Send + Sync {
    /// Stores `bitmap` as the favicon of `site`'s registered domain. Returns
    /// `None` when the site has no registered domain.
    async fn save_favicon(&self, site: &Url, bitmap: &Bitmap) -> Result<Option<FaviconRecord>>;

    /// Looks up the favicon stored for `site`'s registered domain.
    async fn get_favicon(&self, site: &Url) -> Result<Option<Bitmap>>;
}

/// Lowercase hex SHA-256 of `bytes`.
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Content-addressed file name, so identical icons share a file.
pub(crate) fn favicon_path(directory: &Path, bitmap: &Bitmap) -> PathBuf {
    directory.join(format!("{}.png", sha256_hex(bitmap.as_png())))
}

pub(crate) fn file_url(path: &Path) -> Result<Url> {
    Url::from_file_path(path).map_err(|_| FaviconError::InvalidPath(path.display().to_string()))
}

pub(crate) fn url_path(url: &Url) -> Result<PathBuf> {
    url.to_file_path()
        .map_err(|_| FaviconError::InvalidPath(url.to_string()))
}

/// Reads a favicon file, treating a missing file as no favicon.
pub(crate) async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Favicon file is gone");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
