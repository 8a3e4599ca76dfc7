/// Connector abstraction
///
/// A connector implements one node type's external side effect. The engine
/// treats it as an opaque capability: resolved parameters and credentials in,
/// JSON result (or a rejection) out.

use crate::error::ConnectorResult;
use crate::workflow::types::Parameters;
use futures::future::BoxFuture;
use serde_json::{json, Map, Value};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Opaque field -> secret mapping for one connection
pub type Credentials = Map<String, Value>;

/// Per-invocation context handed to a connector
#[derive(Debug, Clone)]
pub struct ConnectorContext {
    pub run_id: String,
    pub node_id: String,
    pub user_id: String,
    /// Forwarded to every call; the baseline engine never triggers it itself
    pub cancellation: CancellationToken,
}

/// Handler for one node type
pub trait Connector: Send + Sync + 'static {
    /// Invoke the connector with fully resolved parameters
    fn invoke(
        &self,
        parameters: Parameters,
        credentials: Credentials,
        ctx: ConnectorContext,
    ) -> BoxFuture<'_, ConnectorResult<Value>>;
}

/// Adapter turning an async closure into a `Connector`
pub struct FnConnector<F> {
    handler: F,
}

impl<F> FnConnector<F> {
    pub fn new<Fut>(handler: F) -> Self
    where
        F: Fn(Parameters, Credentials) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ConnectorResult<Value>> + Send + 'static,
    {
        Self { handler }
    }
}

impl<F, Fut> Connector for FnConnector<F>
where
    F: Fn(Parameters, Credentials) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ConnectorResult<Value>> + Send + 'static,
{
    fn invoke(
        &self,
        parameters: Parameters,
        credentials: Credentials,
        _ctx: ConnectorContext,
    ) -> BoxFuture<'_, ConnectorResult<Value>> {
        Box::pin((self.handler)(parameters, credentials))
    }
}

/// Canned handler for node types with no registered connector
///
/// Keeps unknown or experimental node types from failing a run. Variable
/// setting nodes (`tools`) echo their value; everything else reports a fixed
/// completion payload.
pub fn fallback_output(node_type: &str, parameters: &Parameters) -> Value {
    match node_type {
        "tools" => json!({
            "value": parameters.get("value").cloned().unwrap_or(Value::Null),
            "variableName": parameters.get("variableName").cloned().unwrap_or(Value::Null),
        }),
        _ => {
            tracing::warn!("⚠️ No connector registered for node type '{}', using canned result", node_type);
            json!({
                "output": "Node executed successfully (mock)",
                "status": "completed",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectorError;

    fn ctx() -> ConnectorContext {
        ConnectorContext {
            run_id: "run".to_string(),
            node_id: "n".to_string(),
            user_id: "u".to_string(),
            cancellation: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn test_fn_connector_passes_inputs_through() {
        let connector = FnConnector::new(|params: Parameters, creds: Credentials| async move {
            Ok(json!({ "text": params["text"], "token": creds["token"] }))
        });

        let params = json!({"text": "hello"}).as_object().cloned().unwrap();
        let creds = json!({"token": "t-1"}).as_object().cloned().unwrap();

        let out = connector.invoke(params, creds, ctx()).await.unwrap();
        assert_eq!(out, json!({"text": "hello", "token": "t-1"}));
    }

    #[tokio::test]
    async fn test_fn_connector_rejection() {
        let connector = FnConnector::new(|_: Parameters, _: Credentials| async move {
            Err(ConnectorError::rejected("quota exceeded"))
        });

        let err = connector.invoke(Map::new(), Map::new(), ctx()).await.unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_fallback_outputs() {
        let params = json!({"value": 12, "variableName": "count"}).as_object().cloned().unwrap();
        assert_eq!(fallback_output("tools", &params), json!({"value": 12, "variableName": "count"}));
        assert_eq!(
            fallback_output("experimental", &params),
            json!({"output": "Node executed successfully (mock)", "status": "completed"})
        );
    }
}
