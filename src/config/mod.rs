/// Configuration management for the flowrun server
///
/// Handles server binding and the optional credential seed file.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Credential store configuration
    pub credentials: CredentialsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Where the in-memory credential store is seeded from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// JSON file shaped as `{ "<userId>": [ {id, type, credentials} ] }`.
    /// When unset the server starts with no stored connections.
    pub file: Option<String>,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("FLOWRUN_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("FLOWRUN_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(3004),
            },
            credentials: CredentialsConfig {
                file: std::env::var("FLOWRUN_CREDENTIALS_FILE")
                    .ok()
                    .filter(|f| !f.is_empty()),
            },
        }
    }
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            credentials: CredentialsConfig::default(),
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert!(config.credentials.file.is_none());
    }
}
