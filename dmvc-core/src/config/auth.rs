//! Authentication configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::env;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bypass every auth guard (development and tests only)
    /// Env: SKIP_AUTH ("true" enables)
    /// Default: false
    pub skip_auth: bool,

    /// Static bearer tokens mapped to actor attributes
    pub tokens: HashMap<String, Map<String, Value>>,
}

impl AuthConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(skip) = env::var("SKIP_AUTH") {
            self.skip_auth = skip == "true";
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tokens.keys().any(|t| t.trim().is_empty()) {
            bail!("Invalid auth.tokens: token cannot be empty");
        }
        Ok(())
    }
}
