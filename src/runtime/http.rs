/// Built-in `http-request` connector
///
/// Sends one HTTP request with reqwest. Expected params:
/// `{ "url": "https://api.example.com/data", "method": "POST", "headers": {...}, "body": {...} }`
/// `headers` and `body` may also be JSON-encoded strings, as the editor stores them.

use crate::error::{ConnectorError, ConnectorResult};
use crate::runtime::connectors::{Connector, ConnectorContext, Credentials};
use crate::workflow::types::Parameters;
use futures::future::BoxFuture;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// HTTP client connector; no stored connection required
#[derive(Debug, Clone, Default)]
pub struct HttpRequestConnector {
    client: reqwest::Client,
}

impl HttpRequestConnector {
    pub fn new() -> Self {
        Self::default()
    }

    async fn send(&self, parameters: Parameters, ctx: ConnectorContext) -> ConnectorResult<Value> {
        let url = parameters
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConnectorError::MissingParameter("url".to_string()))?;

        let method = parameters
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("GET")
            .to_uppercase();

        let headers = parse_object_field(&parameters, "headers", "Headers")?;
        let body = parse_body(&parameters)?;

        tracing::debug!("🌍 HTTP Request for node '{}': {} {}", ctx.node_id, method, url);

        let mut request_builder = match method.as_str() {
            "GET" => self.client.get(url),
            "POST" => self.client.post(url),
            "PUT" => self.client.put(url),
            "PATCH" => self.client.patch(url),
            "DELETE" => self.client.delete(url),
            _ => {
                return Err(ConnectorError::InvalidParameter(format!(
                    "Unsupported HTTP method: {}",
                    method
                )))
            }
        };

        for (key, value) in &headers {
            if let Some(header_value) = value.as_str() {
                request_builder = request_builder.header(key.as_str(), header_value);
            }
        }

        if matches!(method.as_str(), "POST" | "PUT" | "PATCH") {
            request_builder = request_builder.json(&body.unwrap_or_else(|| json!({})));
        }

        let response = request_builder
            .send()
            .await
            .map_err(|e| ConnectorError::rejected(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let headers_map: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let response_text = response
            .text()
            .await
            .map_err(|e| ConnectorError::rejected(format!("Failed to read response body: {}", e)))?;

        let data = serde_json::from_str::<Value>(&response_text).unwrap_or(Value::String(response_text));

        if !status.is_success() {
            return Err(ConnectorError::rejected(format!(
                "HTTP {} returned status {}: {}",
                method, status, data
            )));
        }

        tracing::info!("✅ HTTP request completed: {} {} (status: {})", method, url, status);

        Ok(json!({
            "status": status.as_u16(),
            "headers": headers_map,
            "data": data,
            "success": true
        }))
    }
}

impl Connector for HttpRequestConnector {
    fn invoke(
        &self,
        parameters: Parameters,
        _credentials: Credentials,
        ctx: ConnectorContext,
    ) -> BoxFuture<'_, ConnectorResult<Value>> {
        Box::pin(self.send(parameters, ctx))
    }
}

/// Read a field that is either a JSON object or a JSON-encoded object string
fn parse_object_field(parameters: &Parameters, field: &str, label: &str) -> ConnectorResult<Map<String, Value>> {
    match parameters.get(field) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(Map::new()),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(ConnectorError::InvalidParameter(format!("{} field is not valid JSON.", label))),
        },
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(ConnectorError::InvalidParameter(format!("{} field is not valid JSON.", label))),
    }
}

fn parse_body(parameters: &Parameters) -> ConnectorResult<Option<Value>> {
    match parameters.get("body") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => serde_json::from_str(text)
            .map(Some)
            .map_err(|_| ConnectorError::InvalidParameter("Body field is not valid JSON.".to_string())),
        Some(other) => Ok(Some(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    fn params(value: Value) -> Parameters {
        value.as_object().cloned().unwrap()
    }

    fn ctx() -> ConnectorContext {
        ConnectorContext {
            run_id: "run".to_string(),
            node_id: "http".to_string(),
            user_id: "u".to_string(),
            cancellation: CancellationToken::new(),
        }
    }

    #[test]
    fn test_headers_accept_object_or_encoded_string() {
        let from_string = parse_object_field(&params(json!({"headers": "{\"X-Key\": \"1\"}"})), "headers", "Headers").unwrap();
        let from_object = parse_object_field(&params(json!({"headers": {"X-Key": "1"}})), "headers", "Headers").unwrap();
        assert_eq!(from_string, from_object);
        assert!(parse_object_field(&params(json!({})), "headers", "Headers").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_headers_rejected() {
        let err = parse_object_field(&params(json!({"headers": "{oops"})), "headers", "Headers").unwrap_err();
        assert_eq!(err.to_string(), "Headers field is not valid JSON.");
    }

    #[test]
    fn test_body_parsing() {
        assert_eq!(parse_body(&params(json!({"body": "{\"a\": 1}"}))).unwrap(), Some(json!({"a": 1})));
        assert_eq!(parse_body(&params(json!({"body": ""}))).unwrap(), None);
        assert!(parse_body(&params(json!({"body": "nope"}))).is_err());
    }

    #[tokio::test]
    async fn test_missing_url_is_rejected() {
        let connector = HttpRequestConnector::new();
        let err = connector.invoke(Parameters::new(), Credentials::new(), ctx()).await.unwrap_err();
        assert_eq!(err, ConnectorError::MissingParameter("url".to_string()));
        assert_eq!(err.to_string(), "Missing required parameter: url.");
    }

    #[tokio::test]
    async fn test_unsupported_method_is_rejected() {
        let connector = HttpRequestConnector::new();
        let err = connector
            .invoke(params(json!({"url": "http://localhost", "method": "TRACE"})), Credentials::new(), ctx())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported HTTP method: TRACE");
    }
}
