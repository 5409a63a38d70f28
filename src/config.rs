//! Client configuration.
//!
//! Configuration can be built in code through
//! [`ClientBuilder`](crate::client::ClientBuilder) or loaded from JSON:
//!
//! ```
//! use m2m_registration::config::ClientConfig;
//!
//! let config = ClientConfig::from_json(r#"{
//!     "endpoint_name": "node-1",
//!     "servers": [ { "id": 1, "session": 100 } ]
//! }"#).unwrap();
//!
//! assert_eq!(config.endpoint_name, "node-1");
//! assert_eq!(config.servers.len(), 1);
//! ```

use std::collections::HashSet;

use serde::Deserialize;

use crate::client::ServerId;
use crate::error::{RegistrationError, Result};
use crate::transport::SessionHandle;

/// One management server the client registers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Short server id.
    pub id: ServerId,
    /// Transport session reaching the server.
    pub session: SessionHandle,
}

/// Registration client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Endpoint name announced in the `ep=` query.
    pub endpoint_name: String,
    /// Servers to register with.
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

impl ClientConfig {
    /// Create a configuration with no servers.
    pub fn new(endpoint_name: impl Into<String>) -> Self {
        Self {
            endpoint_name: endpoint_name.into(),
            servers: Vec::new(),
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for protocol compliance.
    ///
    /// - Endpoint name is non-empty and contains no `&`
    /// - Server ids are unique
    pub fn validate(&self) -> Result<()> {
        if self.endpoint_name.is_empty() {
            return Err(RegistrationError::Config(
                "endpoint name must not be empty".to_string(),
            ));
        }

        if self.endpoint_name.contains('&') {
            return Err(RegistrationError::Config(format!(
                "endpoint name {:?} contains a query delimiter",
                self.endpoint_name
            )));
        }

        let mut seen = HashSet::new();
        for server in &self.servers {
            if !seen.insert(server.id) {
                return Err(RegistrationError::Config(format!(
                    "duplicate {}",
                    server.id
                )));
            }
        }

        Ok(())
    }
}
