/// Core workflow type definitions
///
/// Defines the nodes, data-flow connections, run input and run output that the
/// engine works with. All types travel as camelCase JSON so they can be posted
/// straight from the editor front-end.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Ordered parameter mapping of a node (field name -> JSON value)
pub type Parameters = Map<String, Value>;

/// Flat environment mapping used for `{{env.KEY}}` tokens
pub type EnvVars = HashMap<String, String>;

/// Run-scoped outputs keyed by node id
pub type NodeOutputs = HashMap<String, Value>;

/// A single work item in the workflow graph
///
/// `node_type` names the connector that executes the node. Leaf strings in
/// `parameters` may embed `{{env.*}}` / `{{data.*}}` tokens which are resolved
/// right before dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    /// Unique node identifier within a run (e.g., "node1")
    pub id: String,
    /// Connector identifier (e.g., "http-request", "telegram-bot")
    #[serde(rename = "type")]
    pub node_type: String,
    /// Node configuration, accepted as `parameters` or the editor's `data`
    #[serde(default, alias = "data")]
    pub parameters: Parameters,
    /// Presentation-only status; written by the engine, never read for control flow
    #[serde(default)]
    pub status: NodeStatus,
}

impl WorkflowNode {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, parameters: Value) -> Self {
        let parameters = match parameters {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self {
            id: id.into(),
            node_type: node_type.into(),
            parameters,
            status: NodeStatus::Idle,
        }
    }
}

/// Display status of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Pending,
    Running,
    Success,
    Error,
}

/// Data-dependency edge between two nodes
///
/// The target consumes the source's output. `condition` is carried as inert
/// metadata and never evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowConnection {
    pub id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl DataFlowConnection {
    pub fn new(
        id: impl Into<String>,
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
            condition: None,
            label: None,
            metadata: Map::new(),
        }
    }
}

/// Everything needed to start one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub data_flow_connections: Vec<DataFlowConnection>,
    #[serde(default)]
    pub env_vars: EnvVars,
    #[serde(default)]
    pub user_id: String,
}

/// Outcome of one attempted node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Success,
    Error,
}

/// Append-only record of one attempted node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub node_id: String,
    pub status: HistoryStatus,
    /// ISO-8601 / RFC 3339 UTC timestamp
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `2024-01-01T12:00:00.000Z`
fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

impl HistoryEntry {
    pub fn success(node_id: impl Into<String>, output: Value) -> Self {
        Self {
            node_id: node_id.into(),
            status: HistoryStatus::Success,
            timestamp: timestamp_now(),
            output: Some(output),
            error: None,
        }
    }

    pub fn error(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            status: HistoryStatus::Error,
            timestamp: timestamp_now(),
            output: None,
            error: Some(message.into()),
        }
    }
}

/// Result of a completed run: outputs of successful nodes plus full history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub outputs: NodeOutputs,
    pub history: Vec<HistoryEntry>,
}

impl RunResult {
    /// Status of a node in this run; `Pending` if it was never attempted
    pub fn node_status(&self, node_id: &str) -> NodeStatus {
        match self.history.iter().find(|entry| entry.node_id == node_id) {
            Some(entry) if entry.status == HistoryStatus::Success => NodeStatus::Success,
            Some(_) => NodeStatus::Error,
            None => NodeStatus::Pending,
        }
    }

    pub fn node_output(&self, node_id: &str) -> Option<&Value> {
        self.outputs.get(node_id)
    }

    /// Write the run's per-node outcome into the presentation-only `status` field
    pub fn apply_statuses(&self, nodes: &mut [WorkflowNode]) {
        for node in nodes.iter_mut() {
            node.status = self.node_status(&node.id);
        }
    }

    pub fn failed_nodes(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history
            .iter()
            .filter(|entry| entry.status == HistoryStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_deserializes_editor_shape() {
        let node: WorkflowNode = serde_json::from_value(json!({
            "id": "node1",
            "type": "telegram-bot",
            "data": { "chatId": "42", "text": "hi" }
        }))
        .unwrap();

        assert_eq!(node.node_type, "telegram-bot");
        assert_eq!(node.status, NodeStatus::Idle);
        let keys: Vec<&String> = node.parameters.keys().collect();
        assert_eq!(keys, vec!["chatId", "text"]);
    }

    #[test]
    fn test_connection_keeps_inert_metadata() {
        let conn: DataFlowConnection = serde_json::from_value(json!({
            "id": "c1",
            "sourceNodeId": "a",
            "targetNodeId": "b",
            "condition": "a.status === \"success\"",
            "metadata": { "priority": "high" }
        }))
        .unwrap();

        assert_eq!(conn.condition.as_deref(), Some("a.status === \"success\""));
        assert_eq!(conn.label, None);
        assert_eq!(conn.metadata["priority"], "high");
    }

    #[test]
    fn test_history_entry_wire_shape() {
        let entry = HistoryEntry::error("n2", "boom");
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["nodeId"], "n2");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "boom");
        assert!(value.get("output").is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(&entry.timestamp).is_ok());
    }

    #[test]
    fn test_history_timestamp_is_millisecond_zulu() {
        let entry = HistoryEntry::success("n1", json!({}));
        let ts = &entry.timestamp;

        // YYYY-MM-DDTHH:MM:SS.sssZ
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[19..20], ".");
        assert!(ts[20..23].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_run_result_statuses() {
        let result = RunResult {
            outputs: NodeOutputs::from([("a".to_string(), json!({"ok": true}))]),
            history: vec![
                HistoryEntry::success("a", json!({"ok": true})),
                HistoryEntry::error("b", "failed"),
            ],
        };

        let mut nodes = vec![
            WorkflowNode::new("a", "tools", json!({})),
            WorkflowNode::new("b", "tools", json!({})),
            WorkflowNode::new("c", "tools", json!({})),
        ];
        result.apply_statuses(&mut nodes);

        assert_eq!(nodes[0].status, NodeStatus::Success);
        assert_eq!(nodes[1].status, NodeStatus::Error);
        assert_eq!(nodes[2].status, NodeStatus::Pending);
        assert_eq!(result.node_output("a"), Some(&json!({"ok": true})));
        assert_eq!(result.node_output("b"), None);
        assert_eq!(result.failed_nodes().count(), 1);
    }
}
