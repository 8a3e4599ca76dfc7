/// Hot-swappable connector registry using ArcSwap
///
/// Maps a node type to its connector, display name and whether it needs stored
/// credentials. Registration swaps the whole map atomically, so runs already
/// in flight keep the snapshot they started dispatching from.

use crate::runtime::connectors::Connector;
use crate::runtime::http::HttpRequestConnector;
use arc_swap::ArcSwap;
use serde::Serialize;
use std::{collections::HashMap, fmt, sync::Arc};

/// One registered connector
#[derive(Clone)]
pub struct ConnectorEntry {
    pub handler: Arc<dyn Connector>,
    pub display_name: String,
    pub requires_connection: bool,
}

impl fmt::Debug for ConnectorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorEntry")
            .field("display_name", &self.display_name)
            .field("requires_connection", &self.requires_connection)
            .finish_non_exhaustive()
    }
}

/// Public description of a registered connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDescriptor {
    pub node_type: String,
    pub display_name: String,
    pub requires_connection: bool,
}

/// Lock-free connector registry
#[derive(Debug, Default)]
pub struct ConnectorRegistry {
    /// Key: node type, Value: connector entry
    entries: ArcSwap<HashMap<String, Arc<ConnectorEntry>>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the connectors shipped in this crate
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register("http-request", "HTTP Request", false, HttpRequestConnector::new());
        registry
    }

    /// Register or replace the connector for a node type
    pub fn register<C: Connector>(
        &self,
        node_type: impl Into<String>,
        display_name: impl Into<String>,
        requires_connection: bool,
        connector: C,
    ) {
        let node_type = node_type.into();
        let entry = Arc::new(ConnectorEntry {
            handler: Arc::new(connector),
            display_name: display_name.into(),
            requires_connection,
        });

        self.entries.rcu(|current| {
            let mut next = (**current).clone();
            next.insert(node_type.clone(), Arc::clone(&entry));
            next
        });

        tracing::info!("🔌 Registered connector: {}", node_type);
    }

    /// Remove a connector; returns whether it existed
    pub fn unregister(&self, node_type: &str) -> bool {
        let mut removed = false;
        self.entries.rcu(|current| {
            let mut next = (**current).clone();
            removed = next.remove(node_type).is_some();
            next
        });

        if removed {
            tracing::info!("Removed connector from registry: {}", node_type);
        }
        removed
    }

    /// Lock-free lookup
    pub fn get(&self, node_type: &str) -> Option<Arc<ConnectorEntry>> {
        self.entries.load().get(node_type).cloned()
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.entries.load().contains_key(node_type)
    }

    /// All registered connectors sorted by node type
    pub fn list(&self) -> Vec<ConnectorDescriptor> {
        let mut descriptors: Vec<ConnectorDescriptor> = self
            .entries
            .load()
            .iter()
            .map(|(node_type, entry)| ConnectorDescriptor {
                node_type: node_type.clone(),
                display_name: entry.display_name.clone(),
                requires_connection: entry.requires_connection,
            })
            .collect();
        descriptors.sort_by(|a, b| a.node_type.cmp(&b.node_type));
        descriptors
    }
}
