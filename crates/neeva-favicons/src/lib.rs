//! Neeva Favicons
//!
//! Two caches share one contract. The regular cache writes image files and
//! records them against the site's registered domain in the history
//! database. The incognito cache encrypts its files and only remembers them
//! in memory, so nothing about incognito browsing outlives the profile.

mod bitmap;
mod cache;
mod domain;
mod encrypter;
mod error;
mod incognito;
mod regular;

pub use bitmap::Bitmap;
pub use cache::{FaviconCache, FaviconRecord};
pub use domain::{domain_hash, DomainProvider, SuffixDomainProvider};
pub use encrypter::{ChaChaFileEncrypter, FileEncrypter};
pub use error::FaviconError;
pub use incognito::IncognitoFaviconCache;
pub use regular::RegularFaviconCache;

pub type Result<T> = std::result::Result<T, FaviconError>;
