//! Server configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server listening port
    /// Env: DMVC_PORT
    /// Default: 3000
    pub port: u16,

    /// Server listening address
    /// Env: DMVC_HOST
    /// Default: "127.0.0.1"
    pub host: String,

    /// Maximum request body size in bytes
    /// Env: DMVC_MAX_BODY_SIZE
    /// Default: 1048576 (1MB)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000, host: "127.0.0.1".to_string(), max_body_size: 1024 * 1024 }
    }
}

impl ServerConfig {
    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        if let Ok(port) = env::var("DMVC_PORT") {
            if let Ok(p) = port.parse() {
                self.port = p;
            }
        }

        if let Ok(host) = env::var("DMVC_HOST") {
            self.host = host;
        }

        if let Ok(size) = env::var("DMVC_MAX_BODY_SIZE") {
            if let Ok(s) = size.parse() {
                self.max_body_size = s;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("Invalid port: port must be between 1 and 65535");
        }

        if self.host.is_empty() {
            bail!("Invalid host: host cannot be empty");
        }

        if self.max_body_size == 0 {
            bail!("Invalid max_body_size: must be greater than 0");
        }

        Ok(())
    }

    /// `host:port` listen address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = ServerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_zero_port_fails() {
        let cfg = ServerConfig { port: 0, ..Default::default() };
        assert!(cfg.validate().unwrap_err().to_string().contains("Invalid port"));
    }

    #[test]
    fn test_zero_body_size_fails() {
        let cfg = ServerConfig { max_body_size: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
