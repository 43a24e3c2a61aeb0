//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] neeva_storage::StorageError),

    #[error("Preference error: {0}")]
    Prefs(#[from] neeva_prefs::PrefsError),

    #[error("Session error: {0}")]
    Session(#[from] neeva_session::SessionError),

    #[error("GraphQL error: {0}")]
    Apollo(#[from] neeva_apollo::ApolloError),

    #[error("Favicon error: {0}")]
    Favicon(#[from] neeva_favicons::FaviconError),

    #[error("Tab error: {0}")]
    Tab(#[from] neeva_tabs::TabError),

    #[error("History error: {0}")]
    History(#[from] neeva_history::HistoryError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
