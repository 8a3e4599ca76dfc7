/// flowrun: dependency-ordered workflow execution engine
///
/// Main entry point for the flowrun server. Loads configuration from the
/// environment and serves the engine over HTTP.

use flowrun::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Workflow execution at POST /api/workflows/execute
/// - Pre-flight validation at POST /api/workflows/validate
/// - Connector listing at GET /api/connectors
/// - Health check at /healthz
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
