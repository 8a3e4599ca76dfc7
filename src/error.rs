/// Error types for the execution engine
///
/// Two tiers mirror how failures propagate through a run:
/// - `EngineError` aborts the whole run before any node executes
/// - `NodeError` is caught per node and recorded in the run history

use thiserror::Error;

/// Run-level failure. Returned to the caller instead of a `RunResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The dependency graph contains a cycle; `node_id` is where the
    /// traversal re-entered an in-progress node.
    #[error("Circular dependency detected involving node {node_id}")]
    CycleDetected { node_id: String },
}

/// Failure of a single connector invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    #[error("Missing required parameter: {0}.")]
    MissingParameter(String),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("{0}")]
    Rejected(String),
}

impl ConnectorError {
    /// Shorthand for handlers that reject with a free-form message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Per-node execution failure, recorded as an error history entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("Connection with ID \"{connection_id}\" not found for node {node_id}")]
    ConnectionNotFound {
        connection_id: String,
        node_id: String,
    },

    #[error("Credential lookup failed for node {node_id}: {message}")]
    CredentialLookup { node_id: String, message: String },

    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

/// Result alias for connector handlers
pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;
