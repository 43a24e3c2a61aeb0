//! Neeva Storage Layer
//!
//! SQLite-backed persistence for history, favicons, tabs and preferences.
//! The schema is versioned; `migrations` upgrades older databases in place.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;
pub use migrations::SCHEMA_VERSION;

pub type Result<T> = std::result::Result<T, StorageError>;
