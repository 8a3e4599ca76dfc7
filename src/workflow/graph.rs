/// Dependency graph construction and topological scheduling
///
/// Converts a node list plus data-flow connections into a petgraph DAG and
/// computes a deterministic execution order. The order comes from a
/// depth-first traversal rooted at each node in input order, so unconnected
/// nodes keep their relative order and producers are pulled in front of their
/// consumers only when needed.

use crate::error::EngineError;
use crate::workflow::types::{DataFlowConnection, WorkflowNode};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// Ephemeral dependency structure, rebuilt for every run
///
/// Edges point from producer (source) to consumer (target). Connections whose
/// endpoints are not both present in the node list are ignored here; the
/// pre-flight validator reports them.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Node weights are node ids, edge weights are connection ids
    graph: DiGraph<String, String>,
    /// Mapping from node ID to graph node index
    node_id_to_index: HashMap<String, NodeIndex>,
    /// Root traversal order (input order, duplicates removed)
    roots: Vec<NodeIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// One pending node in the depth-first traversal
struct Frame {
    index: NodeIndex,
    /// Dependencies in connection order
    dependencies: Vec<NodeIndex>,
    /// Next dependency to descend into
    next: usize,
}

impl DependencyGraph {
    /// Build the graph from nodes and connections
    pub fn build(nodes: &[WorkflowNode], connections: &[DataFlowConnection]) -> Self {
        tracing::debug!(
            "🏗️ Building dependency graph with {} nodes and {} connections",
            nodes.len(),
            connections.len()
        );

        let mut graph = DiGraph::new();
        let mut node_id_to_index = HashMap::new();
        let mut roots = Vec::with_capacity(nodes.len());

        for node in nodes {
            if node_id_to_index.contains_key(&node.id) {
                tracing::warn!("⚠️ Duplicate node id '{}' ignored by graph builder", node.id);
                continue;
            }
            let index = graph.add_node(node.id.clone());
            node_id_to_index.insert(node.id.clone(), index);
            roots.push(index);
        }

        for connection in connections {
            let source = node_id_to_index.get(&connection.source_node_id);
            let target = node_id_to_index.get(&connection.target_node_id);

            match (source, target) {
                (Some(&from), Some(&to)) => {
                    graph.add_edge(from, to, connection.id.clone());
                    tracing::debug!(
                        "  🔗 Added edge: '{}' → '{}'",
                        connection.source_node_id,
                        connection.target_node_id
                    );
                }
                _ => {
                    tracing::debug!(
                        "  ⏭️ Skipping connection '{}' with unknown endpoint",
                        connection.id
                    );
                }
            }
        }

        Self {
            graph,
            node_id_to_index,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.node_id_to_index.contains_key(node_id)
    }

    /// Ids this node depends on, in connection order
    pub fn dependencies(&self, node_id: &str) -> Vec<&str> {
        self.node_id_to_index
            .get(node_id)
            .map(|&index| {
                self.neighbors_in_order(index, Direction::Incoming)
                    .into_iter()
                    .map(|n| self.graph[n].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ids that depend on this node, in connection order
    pub fn dependents(&self, node_id: &str) -> Vec<&str> {
        self.node_id_to_index
            .get(node_id)
            .map(|&index| {
                self.neighbors_in_order(index, Direction::Outgoing)
                    .into_iter()
                    .map(|n| self.graph[n].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Compute the execution order, failing on the first cycle found
    ///
    /// Three-state depth-first traversal: a node is appended only after all
    /// of its dependencies are done. Re-entering an in-progress node is a
    /// cycle and names that node in the error.
    pub fn execution_order(&self) -> Result<Vec<String>, EngineError> {
        tracing::debug!("🔄 Computing topological execution order");

        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut order = Vec::with_capacity(self.graph.node_count());

        for &root in &self.roots {
            if marks[root.index()] == Mark::Unvisited {
                self.visit(root, &mut marks, &mut order)?;
            }
        }

        let ids: Vec<String> = order.into_iter().map(|i| self.graph[i].clone()).collect();
        tracing::debug!("📋 Execution order: {:?}", ids);
        Ok(ids)
    }

    /// Iterative so chain depth is bounded by heap, not by the thread stack
    fn visit(
        &self,
        root: NodeIndex,
        marks: &mut [Mark],
        order: &mut Vec<NodeIndex>,
    ) -> Result<(), EngineError> {
        marks[root.index()] = Mark::InProgress;
        let mut stack = vec![Frame {
            index: root,
            dependencies: self.neighbors_in_order(root, Direction::Incoming),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            match frame.dependencies.get(frame.next).copied() {
                Some(dependency) => {
                    frame.next += 1;
                    match marks[dependency.index()] {
                        Mark::Done => {}
                        Mark::InProgress => {
                            return Err(EngineError::CycleDetected {
                                node_id: self.graph[dependency].clone(),
                            })
                        }
                        Mark::Unvisited => {
                            marks[dependency.index()] = Mark::InProgress;
                            stack.push(Frame {
                                index: dependency,
                                dependencies: self.neighbors_in_order(dependency, Direction::Incoming),
                                next: 0,
                            });
                        }
                    }
                }
                None => {
                    let index = frame.index;
                    stack.pop();
                    marks[index.index()] = Mark::Done;
                    order.push(index);
                }
            }
        }

        Ok(())
    }

    /// Neighbors sorted by edge insertion order
    fn neighbors_in_order(&self, index: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(index, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                (edge.id(), other)
            })
            .collect();
        edges.sort_by_key(|(edge, _)| *edge);
        edges.into_iter().map(|(_, node)| node).collect()
    }
}

/// Convenience wrapper: build the graph and return its execution order
pub fn execution_order(
    nodes: &[WorkflowNode],
    connections: &[DataFlowConnection],
) -> Result<Vec<String>, EngineError> {
    DependencyGraph::build(nodes, connections).execution_order()
}

/// Connections leaving `node_id`
pub fn outgoing_connections<'a>(
    connections: &'a [DataFlowConnection],
    node_id: &str,
) -> Vec<&'a DataFlowConnection> {
    connections
        .iter()
        .filter(|c| c.source_node_id == node_id)
        .collect()
}

/// Connections arriving at `node_id`
pub fn incoming_connections<'a>(
    connections: &'a [DataFlowConnection],
    node_id: &str,
) -> Vec<&'a DataFlowConnection> {
    connections
        .iter()
        .filter(|c| c.target_node_id == node_id)
        .collect()
}
