//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Preference error: {0}")]
    Prefs(#[from] neeva_prefs::PrefsError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Browser has been destroyed")]
    BrowserDestroyed,

    #[error("Cookie store error: {0}")]
    CookieStore(String),
}
