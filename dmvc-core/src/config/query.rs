//! List/count query configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Page size used when a request gives no usable limit
    /// Env: DMVC_PAGE_SIZE
    /// Default: 10
    pub page_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl QueryConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(size) = env::var("DMVC_PAGE_SIZE") {
            if let Ok(s) = size.parse() {
                self.page_size = s;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("Invalid query.page_size: must be greater than 0");
        }
        Ok(())
    }
}
