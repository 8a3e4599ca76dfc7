/// Workflow execution REST API endpoints
///
/// Runs and validates workflows posted by the editor. Nothing is persisted:
/// each request carries the full node and connection lists.

use crate::{
    error::EngineError,
    runtime::{registry::ConnectorDescriptor, ExecutionEngine},
    workflow::{
        types::{DataFlowConnection, HistoryEntry, NodeOutputs, RunRequest, WorkflowNode},
        validator::{validate_workflow, ValidationReport},
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Shared, stateless execution engine
    pub engine: Arc<ExecutionEngine>,
}

/// Response for a completed run
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub outputs: NodeOutputs,
    pub history: Vec<HistoryEntry>,
    /// Input nodes with `status` set from the run outcome
    pub nodes: Vec<WorkflowNode>,
}

/// Request body for validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub data_flow_connections: Vec<DataFlowConnection>,
}

/// Create workflow routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows/execute", post(execute_workflow))
        .route("/api/workflows/validate", post(validate))
        .route("/api/connectors", get(list_connectors))
}

/// Execute a workflow
///
/// POST /api/workflows/execute
/// Body: { "nodes": [...], "dataFlowConnections": [...], "envVars": {...}, "userId": "..." }
/// Returns: { "outputs": {...}, "history": [...], "nodes": [...] }
async fn execute_workflow(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<ExecuteResponse>, (StatusCode, Json<Value>)> {
    match state.engine.execute(&request).await {
        Ok(result) => {
            let mut nodes = request.nodes;
            result.apply_statuses(&mut nodes);

            Ok(Json(ExecuteResponse {
                outputs: result.outputs,
                history: result.history,
                nodes,
            }))
        }
        Err(e @ EngineError::CycleDetected { .. }) => {
            tracing::warn!("Rejected workflow run: {}", e);
            Err((StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": e.to_string() }))))
        }
    }
}

/// Validate a workflow without running it
///
/// POST /api/workflows/validate
/// Returns: { "isValid": bool, "errors": [...], "warnings": [...] }
async fn validate(Json(request): Json<ValidateRequest>) -> Json<ValidationReport> {
    Json(validate_workflow(&request.nodes, &request.data_flow_connections))
}

/// List registered connectors
///
/// GET /api/connectors
async fn list_connectors(State(state): State<AppState>) -> Json<Value> {
    let connectors: Vec<ConnectorDescriptor> = state.engine.registry().list();
    Json(json!({ "connectors": connectors }))
}
