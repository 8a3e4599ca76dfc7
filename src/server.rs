/// Server setup and initialization
///
/// Wires together the connector registry, credential store, execution engine
/// and HTTP routes.

use crate::{
    api::{create_workflow_routes, AppState},
    config::Config,
    runtime::{
        credentials::{CredentialResolver, InMemoryCredentialStore},
        engine::ExecutionEngine,
        registry::ConnectorRegistry,
    },
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Create the main Axum application with all routes
pub fn create_app(config: &Config) -> Result<Router> {
    tracing::info!("🔐 Initializing credential store");
    let credentials: Arc<dyn CredentialResolver> = match &config.credentials.file {
        Some(path) => Arc::new(
            InMemoryCredentialStore::from_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to initialize credential store: {}", e))?,
        ),
        None => {
            tracing::warn!("⚠️ No credentials file configured, connection-based nodes will fail");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    tracing::info!("🔌 Initializing connector registry");
    let registry = Arc::new(ConnectorRegistry::with_builtin());

    tracing::info!("🚀 Initializing execution engine");
    let engine = Arc::new(ExecutionEngine::new(registry, credentials));

    let app = Router::new()
        .route("/healthz", get(health_check))
        .merge(create_workflow_routes().with_state(AppState { engine }));

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting flowrun server...");

    let app = create_app(&config)?;

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CredentialsConfig, ServerConfig};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn config(file: Option<String>) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            credentials: CredentialsConfig { file },
        }
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = create_app(&config(None)).unwrap();
        let resp = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[test]
    fn test_missing_credentials_file_fails_startup() {
        let err = create_app(&config(Some("/nonexistent/credentials.json".to_string()))).unwrap_err();
        assert!(err.to_string().contains("Failed to initialize credential store"));
    }
}
