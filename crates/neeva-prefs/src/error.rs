//! Preference error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("Storage error: {0}")]
    Storage(#[from] neeva_storage::StorageError),
}
