//! graphql types
//!
//! the request body sent to the gateway and wrappers for its responses.

use serde::{Deserialize, Deserializer, Serialize};

/// graphql variables, keyed by name
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// untyped gateway response; `data` is opaque json interpreted by the caller
pub type QueryResponse = GraphQlResponse<serde_json::Value>;

/// a graphql query and its variables
///
/// serializes to `{"query": ..., "variables": {...}}`. variables default to
/// an empty object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    /// graphql document text
    pub query: String,
    /// variable values by name
    pub variables: Variables,
    /// operation to run when the document holds several
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl QueryRequest {
    /// create a request with no variables
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Variables::new(),
            operation_name: None,
        }
    }

    /// replace the variable map
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// set a single variable
    ///
    /// ```
    /// use graph_gateway::QueryRequest;
    ///
    /// let request = QueryRequest::new("query Pools($first: Int!) { pools(first: $first) { id } }")
    ///     .variable("first", 5);
    /// assert_eq!(request.variables["first"], 5);
    /// ```
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// select the operation to run
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

impl From<&str> for QueryRequest {
    fn from(query: &str) -> Self {
        Self::new(query)
    }
}

impl From<String> for QueryRequest {
    fn from(query: String) -> Self {
        Self::new(query)
    }
}

/// graphql response wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlResponse<T> {
    /// response data or null if errors
    pub data: Option<T>,
    /// graphql errors array; `null` or absent reads as empty
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub errors: Vec<GraphQlError>,
    /// optional extensions payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl<T> GraphQlResponse<T> {
    /// true if the response contains graphql errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// graphql error entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    /// error message
    #[serde(default = "default_error_message")]
    pub message: String,
    /// error locations in the query
    #[serde(default, deserialize_with = "null_as_default")]
    pub locations: Vec<GraphQlLocation>,
    /// response path
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: Vec<serde_json::Value>,
    /// optional extensions payload
    #[serde(default)]
    pub extensions: Option<serde_json::Value>,
}

fn default_error_message() -> String {
    "graphql error".to_string()
}

// an explicit `null` reads the same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// graphql error location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlLocation {
    /// line number (1-based)
    pub line: i64,
    /// column number (1-based)
    pub column: i64,
}
