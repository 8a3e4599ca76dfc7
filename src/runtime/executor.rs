/// Per-node dispatch
///
/// Looks up the node's connector, fetches credentials when the connector needs
/// a stored connection, and invokes it with already resolved parameters.
/// Node types without a connector fall back to a canned result.

use crate::error::NodeError;
use crate::runtime::connectors::{fallback_output, ConnectorContext, Credentials};
use crate::runtime::credentials::CredentialResolver;
use crate::runtime::registry::ConnectorRegistry;
use crate::workflow::types::{Parameters, WorkflowNode};
use serde_json::Value;
use std::sync::Arc;

/// Parameter naming the stored connection a node should use
pub const CONNECTION_ID_PARAM: &str = "connectionId";

/// Dispatches single nodes to their connectors
pub struct NodeExecutor {
    registry: Arc<ConnectorRegistry>,
    credentials: Arc<dyn CredentialResolver>,
}

impl std::fmt::Debug for NodeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeExecutor")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl NodeExecutor {
    pub fn new(registry: Arc<ConnectorRegistry>, credentials: Arc<dyn CredentialResolver>) -> Self {
        Self { registry, credentials }
    }

    pub fn registry(&self) -> &Arc<ConnectorRegistry> {
        &self.registry
    }

    /// Execute one node
    ///
    /// `parameters` must already be resolved; raw template text never reaches
    /// a connector from here.
    pub async fn execute_node(
        &self,
        node: &WorkflowNode,
        parameters: Parameters,
        ctx: ConnectorContext,
    ) -> Result<Value, NodeError> {
        let Some(entry) = self.registry.get(&node.node_type) else {
            tracing::debug!("🧩 Node '{}' has no connector for type '{}'", node.id, node.node_type);
            return Ok(fallback_output(&node.node_type, &parameters));
        };

        tracing::debug!("🔌 Dispatching node '{}' to {}", node.id, entry.display_name);

        let credentials = if entry.requires_connection {
            self.fetch_credentials(node, &parameters, &ctx.user_id).await?
        } else {
            Credentials::new()
        };

        let output = entry.handler.invoke(parameters, credentials, ctx).await?;
        Ok(output)
    }

    /// Just-in-time credential lookup for one invocation
    async fn fetch_credentials(
        &self,
        node: &WorkflowNode,
        parameters: &Parameters,
        user_id: &str,
    ) -> Result<Credentials, NodeError> {
        let Some(connection_id) = parameters.get(CONNECTION_ID_PARAM).and_then(Value::as_str) else {
            return Ok(Credentials::new());
        };

        tracing::debug!("🔐 Resolving connection '{}' for node '{}'", connection_id, node.id);

        let connection = self
            .credentials
            .get_connection_by_id(user_id, connection_id)
            .await
            .map_err(|e| NodeError::CredentialLookup {
                node_id: node.id.clone(),
                message: e.to_string(),
            })?;

        match connection {
            Some(connection) => Ok(connection.credentials),
            None => Err(NodeError::ConnectionNotFound {
                connection_id: connection_id.to_string(),
                node_id: node.id.clone(),
            }),
        }
    }
}
