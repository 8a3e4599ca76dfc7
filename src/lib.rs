/// flowrun: dependency-ordered workflow execution engine
///
/// Orders workflow nodes by their data-flow connections, resolves
/// `{{env.*}}` / `{{data.*}}` template tokens, and dispatches each node to a
/// pluggable connector, recording per-node failures without aborting the run.

// Core configuration and setup
pub mod config;

// Engine and node error types
pub mod error;

// Workflow model - types, dependency graph, template resolution, validation
pub mod workflow;

// Runtime execution - connectors, credentials, node dispatch, orchestration
pub mod runtime;

// HTTP API layer - execution and validation endpoints
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use error::{ConnectorError, EngineError, NodeError};
pub use runtime::{
    Connector, ConnectorContext, ConnectorRegistry, CredentialResolver, Credentials, ExecutionEngine,
    FnConnector, InMemoryCredentialStore,
};
pub use server::start_server;
pub use workflow::{
    validate_workflow, DataFlowConnection, HistoryEntry, HistoryStatus, RunRequest, RunResult,
    ValidationReport, WorkflowNode,
};
