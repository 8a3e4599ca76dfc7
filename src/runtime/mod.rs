/// Runtime Execution Layer
///
/// This module runs workflows. It handles:
/// - Connector abstraction and the hot-swappable connector registry
/// - Credential lookup for connectors that need a stored connection
/// - Per-node dispatch with fallback for unknown node types
/// - Sequential, failure-tolerant orchestration of a whole run

// Connector trait, closure adapter and fallback results
pub mod connectors;

// ArcSwap-backed connector registry
pub mod registry;

// Credential resolver trait and in-memory store
pub mod credentials;

// Built-in HTTP request connector
pub mod http;

// Individual node dispatch
pub mod executor;

// Run orchestration
pub mod engine;

// Re-export main types
pub use connectors::{Connector, ConnectorContext, Credentials, FnConnector};
pub use credentials::{Connection, CredentialResolver, InMemoryCredentialStore};
pub use engine::ExecutionEngine;
pub use executor::NodeExecutor;
pub use registry::{ConnectorDescriptor, ConnectorRegistry};
