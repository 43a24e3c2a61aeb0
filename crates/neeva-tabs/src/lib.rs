//! Neeva Tab Records
//!
//! Every open or archived tab has a row in `TabData` holding what is needed
//! to show it in the archive and to restore it: last URL, title and when it
//! was last active. Tabs left untouched for longer than the user's chosen
//! [`ArchiveAfterOption`] are archived automatically.

mod archive;
mod error;
mod manager;
mod tab;

pub use archive::{ArchiveAfterOption, AUTOMATICALLY_ARCHIVE_TABS};
pub use error::TabError;
pub use manager::TabDataManager;
pub use tab::TabData;

pub type Result<T> = std::result::Result<T, TabError>;
