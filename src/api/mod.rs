/// HTTP API Layer
///
/// REST endpoints exposing the engine:
/// - Workflow execution and pre-flight validation
/// - Connector listing

// Workflow execution and validation endpoints
pub mod workflows;

// Re-export router builder
pub use workflows::{create_workflow_routes, AppState};
