/// Workflow execution orchestrator
///
/// Drives one run: build the dependency graph, compute the execution order
/// (aborting on cycles), then execute every node strictly in that order.
/// Node failures are recorded and never stop the run; a cycle aborts it before
/// anything executes.

use crate::error::EngineError;
use crate::runtime::connectors::ConnectorContext;
use crate::runtime::credentials::CredentialResolver;
use crate::runtime::executor::NodeExecutor;
use crate::runtime::registry::ConnectorRegistry;
use crate::workflow::graph::DependencyGraph;
use crate::workflow::types::{HistoryEntry, RunRequest, RunResult, WorkflowNode};
use crate::workflow::validator::{validate_workflow, ValidationReport};
use crate::workflow::variables::VariableResolver;
use std::{collections::HashMap, fmt, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Lifecycle of a single run, used for progress logging
#[derive(Debug, Clone, PartialEq, Eq)]
enum RunPhase<'a> {
    Validating,
    Ordering,
    Executing(&'a str),
    Completed,
}

impl fmt::Display for RunPhase<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Validating => write!(f, "validating"),
            RunPhase::Ordering => write!(f, "ordering"),
            RunPhase::Executing(node_id) => write!(f, "executing({})", node_id),
            RunPhase::Completed => write!(f, "completed"),
        }
    }
}

/// Sequential workflow orchestrator
///
/// Holds no per-run state: outputs and history live in the run itself, so one
/// engine can be shared behind an `Arc` across concurrent runs.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    /// Node executor for handling individual node execution
    executor: Arc<NodeExecutor>,
}

impl ExecutionEngine {
    /// Create an engine with an explicit connector registry and credential resolver
    pub fn new(registry: Arc<ConnectorRegistry>, credentials: Arc<dyn CredentialResolver>) -> Self {
        Self::from_executor(Arc::new(NodeExecutor::new(registry, credentials)))
    }

    pub fn from_executor(executor: Arc<NodeExecutor>) -> Self {
        Self { executor }
    }

    pub fn registry(&self) -> &Arc<ConnectorRegistry> {
        self.executor.registry()
    }

    /// Pre-flight check without executing anything
    pub fn validate(&self, request: &RunRequest) -> ValidationReport {
        validate_workflow(&request.nodes, &request.data_flow_connections)
    }

    /// Execute a workflow run
    pub async fn execute(&self, request: &RunRequest) -> Result<RunResult, EngineError> {
        self.execute_with_cancellation(request, CancellationToken::new()).await
    }

    /// Execute a workflow run, forwarding `cancellation` to every connector call
    ///
    /// The engine itself does not act on the token; connectors may.
    pub async fn execute_with_cancellation(
        &self,
        request: &RunRequest,
        cancellation: CancellationToken,
    ) -> Result<RunResult, EngineError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("run", run_id = %run_id);

        self.run(request, run_id, cancellation).instrument(span).await
    }

    async fn run(
        &self,
        request: &RunRequest,
        run_id: String,
        cancellation: CancellationToken,
    ) -> Result<RunResult, EngineError> {
        let workflow_start_time = std::time::Instant::now();
        tracing::info!(
            "🚀 Starting workflow run with {} nodes and {} connections",
            request.nodes.len(),
            request.data_flow_connections.len()
        );

        tracing::debug!("📍 Phase: {}", RunPhase::Validating);
        let graph = DependencyGraph::build(&request.nodes, &request.data_flow_connections);

        tracing::debug!("📍 Phase: {}", RunPhase::Ordering);
        let order = graph.execution_order().map_err(|e| {
            tracing::error!("❌ Run aborted: {}", e);
            e
        })?;

        let nodes_by_id: HashMap<&str, &WorkflowNode> = request
            .nodes
            .iter()
            .rev()
            .map(|node| (node.id.as_str(), node))
            .collect();

        let mut result = RunResult::default();

        for (step_num, node_id) in order.iter().enumerate() {
            let Some(node) = nodes_by_id.get(node_id.as_str()) else {
                continue;
            };

            tracing::info!(
                "📍 Step {}/{}: {} (type: {})",
                step_num + 1,
                order.len(),
                RunPhase::Executing(node_id),
                node.node_type
            );

            let node_start_time = std::time::Instant::now();

            // Outputs map is only written after the node finishes
            let parameters =
                VariableResolver::new(&request.env_vars, &result.outputs).resolve_parameters(&node.parameters);

            let ctx = ConnectorContext {
                run_id: run_id.clone(),
                node_id: node.id.clone(),
                user_id: request.user_id.clone(),
                cancellation: cancellation.clone(),
            };

            match self.executor.execute_node(node, parameters, ctx).await {
                Ok(output) => {
                    tracing::info!("✅ Node '{}' completed in {:?}", node.id, node_start_time.elapsed());
                    result.outputs.insert(node.id.clone(), output.clone());
                    result.history.push(HistoryEntry::success(node.id.clone(), output));
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Node '{}' failed in {:?} - Error: {}",
                        node.id,
                        node_start_time.elapsed(),
                        e
                    );
                    result.history.push(HistoryEntry::error(node.id.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            "🎉 Workflow run {} in {:?} ({} succeeded, {} failed)",
            RunPhase::Completed,
            workflow_start_time.elapsed(),
            result.outputs.len(),
            result.failed_nodes().count()
        );

        Ok(result)
    }
}
