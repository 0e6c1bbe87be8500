//! Lifecycle hooks around create/update/delete

use crate::error::{ModelError, ModelResult};
use crate::schema::Record;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// When a hook runs relative to the storage write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    BeforeCreate,
    AfterCreate,
    BeforeUpdate,
    AfterUpdate,
    BeforeDelete,
    AfterDelete,
}

/// Async callback receiving the relevant record or key payload
pub type Hook = Arc<dyn Fn(Record) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Ordered hooks per kind; registration order is execution order
#[derive(Clone, Default)]
pub struct HookSet {
    hooks: HashMap<HookKind, Vec<Hook>>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook for `kind`
    pub fn add<F, Fut>(&mut self, kind: HookKind, hook: F) -> &mut Self
    where
        F: Fn(Record) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hooks.entry(kind).or_default().push(Arc::new(move |record| Box::pin(hook(record))));
        self
    }

    /// Append every hook of `other` after the ones already registered
    pub fn extend(&mut self, other: &HookSet) {
        for (kind, hooks) in &other.hooks {
            self.hooks.entry(*kind).or_default().extend(hooks.iter().cloned());
        }
    }

    pub fn push(&mut self, kind: HookKind, hook: Hook) {
        self.hooks.entry(kind).or_default().push(hook);
    }

    pub fn len(&self, kind: HookKind) -> usize {
        self.hooks.get(&kind).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.values().all(Vec::is_empty)
    }

    /// Run every hook of `kind` sequentially; the first failure aborts
    pub async fn run(&self, kind: HookKind, payload: &Record) -> ModelResult<()> {
        let Some(hooks) = self.hooks.get(&kind) else {
            return Ok(());
        };
        for hook in hooks {
            hook(payload.clone()).await.map_err(ModelError::Hook)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for HookSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self.hooks.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("HookSet").field("hooks", &counts).finish()
    }
}
