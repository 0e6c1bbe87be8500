//! Configuration system for DMVC services
//!
//! # Configuration Hierarchy
//!
//! Configuration values are resolved in the following order (highest priority wins):
//!
//! 1. **Code** (builder methods on [`DmvcServer`](crate::app::DmvcServer))
//! 2. **Environment Variables**
//! 3. **Config File** (`dmvc.toml`)
//! 4. **Defaults**
//!
//! ```no_run
//! use dmvc_core::config::DmvcConfig;
//!
//! let config = DmvcConfig::load()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod auth;
pub mod logging;
pub mod query;
pub mod server;
pub mod storage;

pub use auth::AuthConfig;
pub use logging::LoggingConfig;
pub use query::QueryConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name looked up by [`DmvcConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "dmvc.toml";

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmvcConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

impl DmvcConfig {
    /// Load configuration with full supersedence chain
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file; a missing file means defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.server.merge(other.server);
        self.storage.merge(other.storage);
        self.auth.merge(other.auth);
        self.query.merge(other.query);
        self.logging.merge(other.logging);
    }

    /// Apply environment variables to configuration
    pub fn apply_env_vars(&mut self) {
        self.server.apply_env_vars();
        self.storage.apply_env_vars();
        self.auth.apply_env_vars();
        self.query.apply_env_vars();
        self.logging.apply_env_vars();
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.storage.validate()?;
        self.auth.validate()?;
        self.query.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
