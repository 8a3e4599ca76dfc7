/// Pre-flight workflow validation
///
/// Static checks that can run before (and without) executing anything:
/// cycles, dangling data-flow token references, connections pointing at
/// unknown nodes and duplicate node ids.

use crate::workflow::graph::DependencyGraph;
use crate::workflow::types::{DataFlowConnection, WorkflowNode};
use crate::workflow::variables::extract_parameter_references;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Which end of a connection is dangling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => write!(f, "Source"),
            Endpoint::Target => write!(f, "Target"),
        }
    }
}

/// One validation problem; serialized as its message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    Cycle { node_id: String },
    DanglingReference { node_id: String, referenced: String },
    DanglingConnection { connection_id: String, endpoint: Endpoint, node_id: String },
    DuplicateNodeId { node_id: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Cycle { node_id } => {
                write!(f, "Circular dependency detected involving node {}", node_id)
            }
            ValidationIssue::DanglingReference { node_id, referenced } => {
                write!(f, "Node \"{}\" references non-existent node \"{}\"", node_id, referenced)
            }
            ValidationIssue::DanglingConnection { connection_id, endpoint, node_id } => {
                write!(f, "Connection {}: {} node \"{}\" not found", connection_id, endpoint, node_id)
            }
            ValidationIssue::DuplicateNodeId { node_id } => {
                write!(f, "Duplicate node id \"{}\"", node_id)
            }
        }
    }
}

impl Serialize for ValidationIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of a pre-flight check
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    /// Advisory findings that do not affect `is_valid`
    pub warnings: Vec<String>,
}

/// Validate a workflow without executing it
pub fn validate_workflow(nodes: &[WorkflowNode], connections: &[DataFlowConnection]) -> ValidationReport {
    tracing::debug!("🔍 Validating workflow with {} nodes", nodes.len());

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut node_ids: HashSet<&str> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !node_ids.insert(node.id.as_str()) {
            errors.push(ValidationIssue::DuplicateNodeId { node_id: node.id.clone() });
        }
    }

    if let Err(err) = DependencyGraph::build(nodes, connections).execution_order() {
        match err {
            crate::error::EngineError::CycleDetected { node_id } => {
                errors.push(ValidationIssue::Cycle { node_id })
            }
        }
    }

    for node in nodes {
        let mut reported: HashSet<String> = HashSet::new();
        for reference in extract_parameter_references(&node.parameters) {
            if !node_ids.contains(reference.node_id.as_str()) && reported.insert(reference.node_id.clone()) {
                errors.push(ValidationIssue::DanglingReference {
                    node_id: node.id.clone(),
                    referenced: reference.node_id,
                });
            }
        }
    }

    for connection in connections {
        if !node_ids.contains(connection.source_node_id.as_str()) {
            errors.push(ValidationIssue::DanglingConnection {
                connection_id: connection.id.clone(),
                endpoint: Endpoint::Source,
                node_id: connection.source_node_id.clone(),
            });
        }
        if !node_ids.contains(connection.target_node_id.as_str()) {
            errors.push(ValidationIssue::DanglingConnection {
                connection_id: connection.id.clone(),
                endpoint: Endpoint::Target,
                node_id: connection.target_node_id.clone(),
            });
        }
    }

    // Data-flow tokens only accept word characters as node ids
    for node in nodes {
        if !node.id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            warnings.push(format!(
                "Node \"{}\" cannot be referenced by {{{{data.*}}}} tokens: only letters, digits and '_' are matched",
                node.id
            ));
        }
    }

    if !errors.is_empty() {
        tracing::warn!("⚠️ Workflow validation found {} error(s)", errors.len());
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}
