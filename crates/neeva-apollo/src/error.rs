//! GraphQL error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApolloError {
    #[error("User is not logged in")]
    NotLoggedIn,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ApolloError {
    /// Whether retrying later might succeed.
    pub fn is_network(&self) -> bool {
        match self {
            ApolloError::Network(_) => true,
            ApolloError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ApolloError {
    fn from(e: serde_json::Error) -> Self {
        ApolloError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for ApolloError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApolloError::Serialization(e.to_string())
        } else {
            ApolloError::Network(e.to_string())
        }
    }
}
