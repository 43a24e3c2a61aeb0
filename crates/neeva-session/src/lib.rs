//! Neeva Session Management
//!
//! Session tokens are the cookies that identify a user (or an anonymous
//! session) to the backend. The browser engine's cookie store is the source
//! of truth; each [`SessionToken`] keeps a cached copy so requests can be
//! decorated without a round trip, and keeps that copy in step with the
//! browser when cookies change.
//!
//! Three variants exist, chosen at construction:
//! - login: set by the sign-in flow, persisted, never fetched over the network
//! - preview: anonymous session for signed-out users, persisted, refreshable
//! - incognito: anonymous session for the incognito profile, memory only

mod constants;
mod cookies;
mod error;
mod store;
mod token;

pub use constants::NeevaConstants;
pub use cookies::{find_cookie_value, CookieJar, CookieManager};
pub use error::SessionError;
pub use store::{MemoryTokenStore, PrefsTokenStore, TokenStore};
pub use token::{extract_login_token, Credential, SessionToken, TokenKind, TokenState};

pub type Result<T> = std::result::Result<T, SessionError>;
