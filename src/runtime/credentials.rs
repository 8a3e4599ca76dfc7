/// Credential resolution for connectors that need a stored connection
///
/// The engine only sees the `CredentialResolver` trait; where secrets live and
/// how they are decrypted is up to the implementation. Credentials are
/// fetched per node invocation and never cached by the engine.

use crate::runtime::connectors::Credentials;
use anyhow::Result;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};
use tokio::sync::RwLock;

/// A stored connection with already decrypted credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    /// Connector type this connection belongs to (e.g., "google-sheets")
    #[serde(rename = "type")]
    pub connection_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub credentials: Credentials,
}

/// Lookup of a user's connection by id
pub trait CredentialResolver: Send + Sync + 'static {
    /// `Ok(None)` when the user has no such connection
    fn get_connection_by_id<'a>(
        &'a self,
        user_id: &'a str,
        connection_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Connection>>>;
}

/// In-memory connection store keyed by user id
///
/// Used by the HTTP server (optionally seeded from a JSON file) and in tests.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    connections: RwLock<HashMap<String, Vec<Connection>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file shaped as `{ "<userId>": [ {id, type, credentials}, ... ] }`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read credentials file '{}': {}", path.display(), e))?;
        let connections: HashMap<String, Vec<Connection>> = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid credentials file '{}': {}", path.display(), e))?;

        let total: usize = connections.values().map(Vec::len).sum();
        tracing::info!("🔐 Loaded {} connection(s) for {} user(s)", total, connections.len());

        Ok(Self {
            connections: RwLock::new(connections),
        })
    }

    /// Add or replace a connection for a user
    pub async fn insert(&self, user_id: impl Into<String>, connection: Connection) {
        let mut connections = self.connections.write().await;
        let user_connections = connections.entry(user_id.into()).or_default();
        user_connections.retain(|c| c.id != connection.id);
        user_connections.push(connection);
    }

    /// Remove a connection; returns whether it existed
    pub async fn remove(&self, user_id: &str, connection_id: &str) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get_mut(user_id) {
            Some(user_connections) => {
                let before = user_connections.len();
                user_connections.retain(|c| c.id != connection_id);
                before != user_connections.len()
            }
            None => false,
        }
    }
}

impl CredentialResolver for InMemoryCredentialStore {
    fn get_connection_by_id<'a>(
        &'a self,
        user_id: &'a str,
        connection_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Connection>>> {
        Box::pin(async move {
            let connections = self.connections.read().await;
            Ok(connections
                .get(user_id)
                .and_then(|list| list.iter().find(|c| c.id == connection_id))
                .cloned())
        })
    }
}
