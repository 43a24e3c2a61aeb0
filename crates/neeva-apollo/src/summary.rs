//! Outcome of a wrapped GraphQL call

use crate::error::ApolloError;
use crate::operation::GraphQlResponse;

/// Either the backend's response or the error that prevented one.
#[derive(Debug)]
pub enum ResponseSummary<D> {
    Response(GraphQlResponse<D>),
    Failed(ApolloError),
}

impl<D> ResponseSummary<D> {
    pub fn response(&self) -> Option<&GraphQlResponse<D>> {
        match self {
            ResponseSummary::Response(response) => Some(response),
            ResponseSummary::Failed(_) => None,
        }
    }

    pub fn exception(&self) -> Option<&ApolloError> {
        match self {
            ResponseSummary::Response(_) => None,
            ResponseSummary::Failed(error) => Some(error),
        }
    }

    /// Data of a response without remote errors.
    pub fn data(&self) -> Option<&D> {
        self.response()
            .filter(|response| !response.has_errors())
            .and_then(|response| response.data.as_ref())
    }

    pub fn into_result(self) -> std::result::Result<GraphQlResponse<D>, ApolloError> {
        match self {
            ResponseSummary::Response(response) => Ok(response),
            ResponseSummary::Failed(error) => Err(error),
        }
    }
}

impl<D> From<std::result::Result<GraphQlResponse<D>, ApolloError>> for ResponseSummary<D> {
    fn from(result: std::result::Result<GraphQlResponse<D>, ApolloError>) -> Self {
        match result {
            Ok(response) => ResponseSummary::Response(response),
            Err(error) => ResponseSummary::Failed(error),
        }
    }
}
