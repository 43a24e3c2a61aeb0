//! Favicon error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaviconError {
    #[error("Storage error: {0}")]
    Storage(#[from] neeva_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("Invalid favicon path: {0}")]
    InvalidPath(String),
}
