//! Tab error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Tab not found: {0}")]
    NotFound(String),

    #[error("Tab {0} is not archived")]
    NotArchived(String),

    #[error("Storage error: {0}")]
    Storage(#[from] neeva_storage::StorageError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
