//! Neeva GraphQL Access
//!
//! [`ApolloWrapper`] is the single entry point for backend queries and
//! mutations. It decides from its [`CredentialPolicy`] whether a request may
//! go out at all, attaches the session cookie, and folds every outcome into
//! a [`ResponseSummary`] so failures never propagate past it.

mod error;
mod operation;
mod summary;
mod transport;
mod wrapper;

pub use error::ApolloError;
pub use operation::{GraphQlError, GraphQlRequest, GraphQlResponse, Operation, OperationKind};
pub use summary::ResponseSummary;
pub use transport::{GraphQlTransport, HttpTransport};
pub use wrapper::{ApolloWrapper, CredentialPolicy};

pub type Result<T> = std::result::Result<T, ApolloError>;
