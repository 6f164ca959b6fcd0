//! Error types for CURIE translation and knowledge-graph lookups

use thiserror::Error;

/// Result type alias for lookup operations
pub type Result<T> = std::result::Result<T, LookupError>;

/// Errors raised while decomposing or building a CURIE
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurieError {
    /// Zero or more than one `:` separator
    #[error("There must be exactly one ':' in the curie: {0}")]
    Malformed(String),

    /// Prefix is not present in the namespace registry
    #[error("Unknown namespace '{namespace}' in curie: {curie}")]
    UnknownNamespace { namespace: String, curie: String },
}

impl CurieError {
    /// The identifier the caller sent, echoed back in client errors
    pub fn identifier(&self) -> &str {
        match self {
            CurieError::Malformed(curie) => curie,
            CurieError::UnknownNamespace { curie, .. } => curie,
        }
    }
}

/// Failures at the knowledge-graph boundary.
///
/// Messages carry the transport status or payload problem, never the
/// text of the query that was sent.
#[derive(Error, Debug)]
pub enum GraphError {
    /// SPARQL endpoint returned a non-success status or an unreadable body
    #[error("Query execution error: {0}")]
    QueryExecution(String),

    /// Entity API unreachable, failed, returned an embedded error, or reported missing ids
    #[error("Remote lookup error: {0}")]
    RemoteLookup(String),
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::QueryExecution(format!("malformed response body: {}", err))
    }
}

/// Main error type for the lookup core
#[derive(Error, Debug)]
pub enum LookupError {
    #[error(transparent)]
    Curie(#[from] CurieError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A snak carried a value type the claim parser does not decode
    #[error("Unsupported value type '{value_type}' for property {property}")]
    UnsupportedValue { property: String, value_type: String },

    /// Request parameters outside the accepted range
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl LookupError {
    /// Whether the failure is the caller's fault (4xx) rather than upstream (5xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, LookupError::Curie(_) | LookupError::InvalidRequest(_))
    }
}
