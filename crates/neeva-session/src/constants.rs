//! Backend endpoints and cookie names

use url::Url;

use crate::Result;

/// Endpoints and identifiers of the Neeva backend.
///
/// Constructed once per app from the configured host and passed to every
/// component that talks to the backend.
#[derive(Debug, Clone)]
pub struct NeevaConstants {
    pub app_host: String,
    pub app_url: Url,
    pub apollo_url: Url,
    pub preview_url: Url,
    pub incognito_url: Url,
    pub browser_version: String,
}

impl NeevaConstants {
    pub const LOGIN_COOKIE: &'static str = "httpd~login";
    pub const PREVIEW_COOKIE: &'static str = "httpd~preview";
    pub const INCOGNITO_COOKIE: &'static str = "httpd~incognito";

    /// Identifies this client when making backend requests.
    pub const BROWSER_IDENTIFIER: &'static str = "co.neeva.app.android.browser";
    pub const BROWSER_TYPE_COOKIE: &'static str = "BrowserType";
    pub const BROWSER_TYPE: &'static str = "neeva-android";
    pub const BROWSER_VERSION_COOKIE: &'static str = "BrowserVersion";

    pub fn new(app_host: &str, browser_version: &str) -> Result<Self> {
        let app_url = Url::parse(&format!("https://{app_host}/"))?;

        Ok(Self {
            app_host: app_host.to_string(),
            apollo_url: app_url.join("graphql")?,
            preview_url: app_url.join("preview/session")?,
            incognito_url: app_url.join("incognito/session")?,
            app_url,
            browser_version: browser_version.to_string(),
        })
    }

    /// Cookies sent with every backend request regardless of session.
    pub fn browser_cookies(&self) -> Vec<(String, String)> {
        vec![
            (
                Self::BROWSER_TYPE_COOKIE.to_string(),
                Self::BROWSER_TYPE.to_string(),
            ),
            (
                Self::BROWSER_VERSION_COOKIE.to_string(),
                self.browser_version.clone(),
            ),
        ]
    }
}

impl Default for NeevaConstants {
    fn default() -> Self {
        Self::new("neeva.com", env!("CARGO_PKG_VERSION")).expect("default host is a valid URL")
    }
}
