//! Browser cookie access
//!
//! [`CookieManager`] is the seam to the browser engine's cookie store.
//! [`CookieJar`] is an in-process implementation on top of
//! `reqwest_cookie_store`, which is also what the HTTP clients of a profile
//! read their cookies from.

use async_trait::async_trait;
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

use crate::error::SessionError;
use crate::Result;

/// Cookie store of a browser profile.
#[async_trait]
pub trait CookieManager: Send + Sync {
    /// The `name=value; name2=value2` string the browser would send to `url`.
    async fn get_cookie(&self, url: &Url) -> Result<String>;

    /// Stores a `Set-Cookie` style line. Returns false if the store rejected it.
    async fn set_cookie(&self, url: &Url, cookie: &str) -> Result<bool>;

    /// Removes the cookie `name` visible to `url`. Returns true once the
    /// cookie is gone, including when it never existed.
    async fn remove_cookie(&self, url: &Url, name: &str) -> Result<bool>;

    /// Whether the owning browser has been torn down.
    fn is_destroyed(&self) -> bool;
}

/// Finds `name` in a `name=value; ...` cookie string.
pub fn find_cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
}

/// In-process cookie store for one profile.
pub struct CookieJar {
    store: Arc<CookieStoreMutex>,
    destroyed: AtomicBool,
}

impl CookieJar {
    pub fn new() -> Self {
        Self {
            store: Arc::new(CookieStoreMutex::new(CookieStore::default())),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Shared handle for use as a `reqwest` cookie provider.
    pub fn store(&self) -> Arc<CookieStoreMutex> {
        Arc::clone(&self.store)
    }

    /// Marks the jar unusable, as happens when a profile is closed.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        if let Ok(mut store) = self.store.lock() {
            store.clear();
        }
        tracing::debug!("Cookie jar destroyed");
    }

    fn check_alive(&self) -> Result<()> {
        if self.is_destroyed() {
            Err(SessionError::BrowserDestroyed)
        } else {
            Ok(())
        }
    }

    fn request_values(&self, url: &Url) -> Result<String> {
        let store = self
            .store
            .lock()
            .map_err(|e| SessionError::CookieStore(e.to_string()))?;
        let pairs: Vec<String> = store
            .get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Ok(pairs.join("; "))
    }
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CookieManager for CookieJar {
    async fn get_cookie(&self, url: &Url) -> Result<String> {
        self.check_alive()?;
        self.request_values(url)
    }

    async fn set_cookie(&self, url: &Url, cookie: &str) -> Result<bool> {
        self.check_alive()?;
        let mut store = self
            .store
            .lock()
            .map_err(|e| SessionError::CookieStore(e.to_string()))?;

        match store.parse(cookie, url) {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Cookie rejected by store");
                Ok(false)
            }
        }
    }

    async fn remove_cookie(&self, url: &Url, name: &str) -> Result<bool> {
        self.check_alive()?;

        if find_cookie_value(&self.request_values(url)?, name).is_none() {
            return Ok(true);
        }

        {
            let mut store = self
                .store
                .lock()
                .map_err(|e| SessionError::CookieStore(e.to_string()))?;
            // An already-expired cookie replaces and evicts the stored one.
            let _ = store.parse(&format!("{name}=; Path=/; Max-Age=0"), url);
        }

        Ok(find_cookie_value(&self.request_values(url)?, name).is_none())
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}
