//! Storage configuration
//!
//! Values used to build a storage client when no `{client, table}` pair has
//! been configured explicitly on the model registry.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Env: AWS_REGION
    /// Default: "us-east-1"
    pub region: String,

    /// Custom endpoint, e.g. a local DynamoDB
    /// Env: DYNAMODB_ENDPOINT
    pub endpoint: Option<String>,

    /// Env: DYNAMODB_TABLE_NAME
    /// Default: "test"
    pub table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { region: "us-east-1".to_string(), endpoint: None, table: "test".to_string() }
    }
}

impl StorageConfig {
    /// Defaults overlaid with the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_vars();
        config
    }

    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(region) = env::var("AWS_REGION") {
            if !region.is_empty() {
                self.region = region;
            }
        }
        if let Ok(endpoint) = env::var("DYNAMODB_ENDPOINT") {
            if !endpoint.is_empty() {
                self.endpoint = Some(endpoint);
            }
        }
        if let Ok(table) = env::var("DYNAMODB_TABLE_NAME") {
            if !table.is_empty() {
                self.table = table;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.table.is_empty() {
            bail!("Invalid storage.table: table name cannot be empty");
        }
        if self.region.is_empty() {
            bail!("Invalid storage.region: region cannot be empty");
        }
        Ok(())
    }
}
