//! GraphQL operation and wire types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// A hand-declared GraphQL operation.
pub trait Operation: Send + Sync {
    type Data: DeserializeOwned + Send;

    const KIND: OperationKind;

    fn name(&self) -> &'static str;

    fn document(&self) -> &'static str;

    fn variables(&self) -> Value {
        Value::Object(Default::default())
    }
}

/// Body POSTed to the GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub operation_name: String,
    pub query: String,
    pub variables: Value,
}

impl GraphQlRequest {
    pub fn for_operation<O: Operation>(operation: &O) -> Self {
        Self {
            operation_name: operation.name().to_string(),
            query: operation.document().to_string(),
            variables: operation.variables(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "D: Deserialize<'de>"))]
pub struct GraphQlResponse<D> {
    #[serde(default)]
    pub data: Option<D>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl<D> GraphQlResponse<D> {
    /// True when the backend reported errors alongside (or instead of) data.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
