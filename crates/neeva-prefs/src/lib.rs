//! Neeva Preferences
//!
//! Persisted key-value settings grouped into folders. Every key is typed and
//! carries its own default, so a missing or unreadable value never surfaces
//! as an error to readers. Enum values are stored by name.

mod backend;
mod error;
mod folder;
mod key;
pub mod keys;
mod model;

pub use backend::{DatabasePreferences, InMemoryPreferences, PreferenceBackend};
pub use error::PrefsError;
pub use folder::PrefFolder;
pub use key::{CollapsingSectionState, PrefKey, PrefValue};
pub use model::{PrefChange, SharedPreferencesModel};

pub type Result<T> = std::result::Result<T, PrefsError>;
