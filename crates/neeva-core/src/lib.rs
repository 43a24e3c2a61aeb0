//! Neeva Core
//!
//! Wires the feature crates into one application. [`Neeva`] owns everything
//! belonging to the regular profile and hands out [`IncognitoProfile`]
//! values whose state is discarded when they close. Nothing here is a
//! process-wide global; callers construct what they need.

mod config;
mod error;
mod neeva;
mod user;

pub use config::Config;
pub use error::CoreError;
pub use neeva::{IncognitoProfile, Neeva};
pub use user::{NeevaUser, SsoProvider, SubscriptionType, UserInfo, UserInfoQuery};

// Re-export core components
pub use neeva_apollo::{ApolloError, ApolloWrapper, CredentialPolicy, ResponseSummary};
pub use neeva_favicons::{Bitmap, FaviconCache, IncognitoFaviconCache, RegularFaviconCache};
pub use neeva_history::{HistoryEntry, HistoryManager};
pub use neeva_prefs::{PrefFolder, SharedPreferencesModel};
pub use neeva_session::{CookieJar, CookieManager, NeevaConstants, SessionToken};
pub use neeva_storage::{Database, StorageError};
pub use neeva_tabs::{ArchiveAfterOption, TabData, TabDataManager};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
