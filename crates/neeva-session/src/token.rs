//! Session token cache and refresh

use neeva_prefs::{keys, SharedPreferencesModel};
use parking_lot::{Mutex, RwLock};
use reqwest::header::{COOKIE, USER_AGENT};
use std::sync::Arc;
use url::Url;

use crate::constants::NeevaConstants;
use crate::cookies::{find_cookie_value, CookieManager};
use crate::store::{MemoryTokenStore, PrefsTokenStore, TokenStore};
use crate::Result;

/// Which session cookie a [`SessionToken`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Login,
    Preview,
    Incognito,
}

impl TokenKind {
    pub fn cookie_name(&self) -> &'static str {
        match self {
            TokenKind::Login => NeevaConstants::LOGIN_COOKIE,
            TokenKind::Preview => NeevaConstants::PREVIEW_COOKIE,
            TokenKind::Incognito => NeevaConstants::INCOGNITO_COOKIE,
        }
    }

    /// Login cookies only come from the sign-in flow.
    pub fn can_request(&self) -> bool {
        !matches!(self, TokenKind::Login)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Empty,
    Fetching,
    Cached,
}

/// A cookie value handed to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub value: String,
    /// True when read from the browser or the network during this call,
    /// false when it came from the local cache.
    pub fresh: bool,
}

impl Credential {
    fn fresh(value: String) -> Self {
        Self { value, fresh: true }
    }

    fn cached(value: String) -> Self {
        Self {
            value,
            fresh: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

struct Remote {
    endpoint: Url,
    http: reqwest::Client,
}

/// Restores the pre-fetch state unless the fetch ran to completion.
struct FetchGuard<'a> {
    state: &'a Mutex<TokenState>,
    previous: TokenState,
    completed: bool,
}

impl<'a> FetchGuard<'a> {
    fn begin(state: &'a Mutex<TokenState>) -> Self {
        let previous = std::mem::replace(&mut *state.lock(), TokenState::Fetching);
        Self {
            state,
            previous,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let mut state = self.state.lock();
        if *state == TokenState::Fetching {
            *state = self.previous;
        }
    }
}

/// Cached copy of one session cookie, kept in step with the browser.
pub struct SessionToken {
    kind: TokenKind,
    cookie_name: &'static str,
    app_url: Url,
    client_cookies: String,
    remote: Option<Remote>,
    cookie_manager: RwLock<Option<Arc<dyn CookieManager>>>,
    store: Box<dyn TokenStore>,
    cached: Mutex<String>,
    state: Mutex<TokenState>,
    fetch_lock: tokio::sync::Mutex<()>,
}

impl SessionToken {
    fn new(
        kind: TokenKind,
        constants: &NeevaConstants,
        store: Box<dyn TokenStore>,
        remote: Option<Remote>,
    ) -> Self {
        let cached = store.load();
        let state = if cached.is_empty() {
            TokenState::Empty
        } else {
            TokenState::Cached
        };
        let client_cookies = constants
            .browser_cookies()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");

        Self {
            kind,
            cookie_name: kind.cookie_name(),
            app_url: constants.app_url.clone(),
            client_cookies,
            remote,
            cookie_manager: RwLock::new(None),
            store,
            cached: Mutex::new(cached),
            state: Mutex::new(state),
            fetch_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Tracks `httpd~login`, persisted under `USER/TOKEN`.
    pub fn login(constants: &NeevaConstants, prefs: SharedPreferencesModel) -> Self {
        Self::new(
            TokenKind::Login,
            constants,
            Box::new(PrefsTokenStore::new(prefs, keys::user::TOKEN)),
            None,
        )
    }

    /// Tracks `httpd~preview`, persisted under `USER/PREVIEW_SESSION_TOKEN`.
    pub fn preview(
        constants: &NeevaConstants,
        prefs: SharedPreferencesModel,
        http: reqwest::Client,
    ) -> Self {
        Self::new(
            TokenKind::Preview,
            constants,
            Box::new(PrefsTokenStore::new(prefs, keys::user::PREVIEW_SESSION_TOKEN)),
            Some(Remote {
                endpoint: constants.preview_url.clone(),
                http,
            }),
        )
    }

    /// Tracks `httpd~incognito`. Never written to disk.
    pub fn incognito(constants: &NeevaConstants, http: reqwest::Client) -> Self {
        Self::new(
            TokenKind::Incognito,
            constants,
            Box::new(MemoryTokenStore::new()),
            Some(Remote {
                endpoint: constants.incognito_url.clone(),
                http,
            }),
        )
    }

    /// Overrides where new cookies are requested from. Ignored for login tokens.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        if let Some(remote) = self.remote.as_mut() {
            remote.endpoint = endpoint;
        }
        self
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn cookie_name(&self) -> &'static str {
        self.cookie_name
    }

    pub fn cached_value(&self) -> String {
        self.cached.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.cached.lock().is_empty()
    }

    pub fn state(&self) -> TokenState {
        *self.state.lock()
    }

    /// Replaces the cached value. Storage is only touched when the value
    /// changes, and an empty value removes the stored entry.
    pub fn update_cached_cookie(&self, value: &str) -> Result<()> {
        let mut cached = self.cached.lock();
        if *cached != value {
            if value.is_empty() {
                self.store.remove()?;
            } else {
                self.store.save(value)?;
            }
            *cached = value.to_string();
            tracing::debug!(
                cookie = self.cookie_name,
                empty = value.is_empty(),
                "Session token updated"
            );
        }
        *self.state.lock() = TokenState::Cached;
        Ok(())
    }

    /// Saves a value obtained outside the browser, such as from a sign-in
    /// deep link, and pushes it into the attached browser.
    pub async fn store_cookie(&self, value: &str) -> Result<()> {
        self.update_cached_cookie(value)?;
        if let Some(manager) = self.live_manager() {
            self.push_to_browser(manager.as_ref(), value).await;
        }
        Ok(())
    }

    /// Returns the browser's cookie, requesting a new one from the backend
    /// when the browser has none and this kind of token allows it. Without
    /// an attached browser the cached value is returned.
    ///
    /// Dropping the returned future leaves the cache untouched.
    pub async fn get_or_fetch_cookie(&self) -> Result<Credential> {
        let _fetching = self.fetch_lock.lock().await;

        let Some(manager) = self.live_manager() else {
            return Ok(Credential::cached(self.cached_value()));
        };

        let guard = FetchGuard::begin(&self.state);

        if let Some(value) = self.read_browser_cookie(manager.as_ref()).await? {
            self.update_cached_cookie(&value)?;
            guard.complete();
            return Ok(Credential::fresh(value));
        }

        let Some(value) = self.request_new_cookie().await? else {
            return Ok(Credential::fresh(String::new()));
        };

        self.update_cached_cookie(&value)?;
        self.push_to_browser(manager.as_ref(), &value).await;
        guard.complete();

        tracing::info!(cookie = self.cookie_name, "Fetched new session cookie");
        Ok(Credential::fresh(value))
    }

    /// Attaches the browser's cookie store and reconciles it with the cache.
    pub async fn initialize_cookie_manager(
        &self,
        manager: Arc<dyn CookieManager>,
        request_if_empty: bool,
    ) -> Result<()> {
        *self.cookie_manager.write() = Some(Arc::clone(&manager));

        match self.read_browser_cookie(manager.as_ref()).await? {
            Some(value) => self.update_cached_cookie(&value)?,
            None => {
                let cached = self.cached_value();
                if !cached.is_empty() {
                    self.push_to_browser(manager.as_ref(), &cached).await;
                } else if request_if_empty && self.kind.can_request() {
                    self.get_or_fetch_cookie().await?;
                }
            }
        }
        Ok(())
    }

    /// Re-reads the browser cookie after it reported a change.
    pub async fn on_cookie_changed(&self) -> Result<()> {
        let Some(manager) = self.live_manager() else {
            return Ok(());
        };

        let value = self
            .read_browser_cookie(manager.as_ref())
            .await?
            .unwrap_or_default();
        self.update_cached_cookie(&value)
    }

    pub fn detach_cookie_manager(&self) {
        self.cookie_manager.write().take();
    }

    /// Removes the cookie from the browser and, only if that worked, from
    /// the cache. Returns whether the token is now cleared.
    pub async fn purge_cached_cookie(&self) -> bool {
        let manager = self.cookie_manager.read().clone();

        if let Some(manager) = manager {
            match manager.remove_cookie(&self.app_url, self.cookie_name).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(cookie = self.cookie_name, "Browser kept session cookie");
                    return false;
                }
                Err(e) => {
                    tracing::warn!(
                        cookie = self.cookie_name,
                        error = %e,
                        "Failed to remove session cookie from browser"
                    );
                    return false;
                }
            }
        }

        match self.update_cached_cookie("") {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(cookie = self.cookie_name, error = %e, "Failed to clear session token");
                false
            }
        }
    }

    fn live_manager(&self) -> Option<Arc<dyn CookieManager>> {
        self.cookie_manager
            .read()
            .clone()
            .filter(|manager| !manager.is_destroyed())
    }

    async fn read_browser_cookie(&self, manager: &dyn CookieManager) -> Result<Option<String>> {
        let header = manager.get_cookie(&self.app_url).await?;
        Ok(find_cookie_value(&header, self.cookie_name).filter(|value| !value.is_empty()))
    }

    async fn push_to_browser(&self, manager: &dyn CookieManager, value: &str) -> bool {
        let cookie = format!("{}={}; Path=/; Secure", self.cookie_name, value);
        match manager.set_cookie(&self.app_url, &cookie).await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(cookie = self.cookie_name, error = %e, "Failed to set browser cookie");
                false
            }
        }
    }

    async fn request_new_cookie(&self) -> Result<Option<String>> {
        let Some(remote) = &self.remote else {
            return Ok(None);
        };

        let response = remote
            .http
            .post(remote.endpoint.clone())
            .header(COOKIE, &self.client_cookies)
            .header(USER_AGENT, NeevaConstants::BROWSER_IDENTIFIER)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(
                endpoint = %remote.endpoint,
                status = %response.status(),
                "Session cookie request rejected"
            );
            return Ok(None);
        }

        let token = response
            .cookies()
            .find(|cookie| cookie.name() == self.cookie_name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty());
        Ok(token)
    }
}

/// Pulls the login cookie out of a `neeva://login?sessionKey=...` link.
pub fn extract_login_token(uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    if url.scheme() != "neeva" || url.host_str() != Some("login") {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "sessionKey")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
