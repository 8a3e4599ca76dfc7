/// Workflow Model Layer
///
/// Everything that can be computed about a workflow without executing it:
/// - Type definitions (WorkflowNode, DataFlowConnection, run input/output)
/// - Dependency graph construction and topological ordering
/// - `{{env.*}}` / `{{data.*}}` template resolution
/// - Pre-flight validation

// Core workflow type definitions
pub mod types;

// Petgraph-backed dependency graph and scheduler
pub mod graph;

// Template token resolver
pub mod variables;

// Static pre-flight checks
pub mod validator;

// Re-export commonly used types
pub use graph::{execution_order, DependencyGraph};
pub use types::{
    DataFlowConnection, EnvVars, HistoryEntry, HistoryStatus, NodeOutputs, NodeStatus, Parameters,
    RunRequest, RunResult, WorkflowNode,
};
pub use validator::{validate_workflow, ValidationIssue, ValidationReport};
pub use variables::VariableResolver;
