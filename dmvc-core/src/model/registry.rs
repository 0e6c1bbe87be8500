//! Model registry: storage configuration and lazily built model instances
//!
//! The registry replaces per-class static state. It owns the default
//! `{client, table}` pair, per-model overrides, runtime hook additions and a
//! cache holding exactly one [`Model`] per definition. Any configuration
//! change invalidates the affected cached instances; the next lookup rebuilds
//! them against the new storage.

use super::{HookKind, HookSet, Model, ModelDefinition, ModelId};
use crate::config::StorageConfig;
use crate::error::ModelResult;
use crate::schema::Record;
use crate::storage::{MemoryClient, StorageClient};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage client and table a model is bound to
#[derive(Clone)]
pub struct StoreConfig {
    pub client: Arc<dyn StorageClient>,
    pub table: String,
}

impl StoreConfig {
    pub fn new(client: Arc<dyn StorageClient>, table: impl Into<String>) -> Self {
        Self { client, table: table.into() }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("client", &self.client.name())
            .field("table", &self.table)
            .finish()
    }
}

/// Builds a client from environment-derived settings when nothing was configured
pub type ClientFactory = Arc<dyn Fn(&StorageConfig) -> Arc<dyn StorageClient> + Send + Sync>;

#[derive(Default)]
struct RegistryState {
    defaults: Option<StoreConfig>,
    fallback: Option<StoreConfig>,
    overrides: HashMap<ModelId, StoreConfig>,
    extra_hooks: HashMap<ModelId, HookSet>,
    instances: HashMap<ModelId, Arc<Model>>,
}

pub struct ModelRegistry {
    state: RwLock<RegistryState>,
    settings: StorageConfig,
    client_factory: ClientFactory,
}

impl ModelRegistry {
    /// Registry whose fallback storage comes from the environment
    pub fn new() -> Self {
        Self::with_settings(StorageConfig::from_env())
    }

    pub fn with_settings(settings: StorageConfig) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            settings,
            client_factory: Arc::new(|settings: &StorageConfig| {
                log::warn!(
                    "No storage client configured; using in-memory storage (region {}, endpoint {})",
                    settings.region,
                    settings.endpoint.as_deref().unwrap_or("default")
                );
                Arc::new(MemoryClient::new()) as Arc<dyn StorageClient>
            }),
        }
    }

    /// Replace the factory used to build the fallback client
    pub fn with_client_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&StorageConfig) -> Arc<dyn StorageClient> + Send + Sync + 'static,
    {
        self.client_factory = Arc::new(factory);
        self
    }

    /// Set the process-wide default store and invalidate every cached model
    pub async fn configure(&self, config: StoreConfig) {
        let mut state = self.state.write().await;
        log::info!("🔧 Default store: {} client, table '{}'", config.client.name(), config.table);
        state.defaults = Some(config);
        state.instances.clear();
    }

    /// Bind one model to its own store
    pub async fn configure_model<D: ModelDefinition>(&self, config: StoreConfig) {
        let id = ModelId::of::<D>();
        let mut state = self.state.write().await;
        state.overrides.insert(id, config);
        state.instances.remove(&id);
    }

    /// Propagate the current default store to `models`, dropping their cached instances
    pub async fn register(&self, models: &[ModelId]) {
        let mut state = self.state.write().await;
        for id in models {
            match state.defaults.clone() {
                Some(defaults) => {
                    state.overrides.insert(*id, defaults);
                }
                None => {
                    state.overrides.remove(id);
                }
            }
            state.instances.remove(id);
            log::debug!("Registered model {}", id.name());
        }
    }

    /// Append a hook to `D` at runtime
    pub async fn add_hook<D, F, Fut>(&self, kind: HookKind, hook: F)
    where
        D: ModelDefinition,
        F: Fn(Record) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let id = ModelId::of::<D>();
        let mut state = self.state.write().await;
        state.extra_hooks.entry(id).or_default().add(kind, hook);
        state.instances.remove(&id);
    }

    /// Drop the cached instance of `D`
    pub async fn invalidate<D: ModelDefinition>(&self) {
        self.state.write().await.instances.remove(&ModelId::of::<D>());
    }

    /// Store `D` resolves to right now
    pub async fn store_for<D: ModelDefinition>(&self) -> StoreConfig {
        let mut state = self.state.write().await;
        self.resolve_store(&mut state, ModelId::of::<D>())
    }

    /// The single cached instance of `D`, built on first use
    pub async fn model<D: ModelDefinition>(&self) -> ModelResult<Arc<Model>> {
        let id = ModelId::of::<D>();
        if let Some(model) = self.state.read().await.instances.get(&id) {
            return Ok(model.clone());
        }

        let mut state = self.state.write().await;
        if let Some(model) = state.instances.get(&id) {
            return Ok(model.clone());
        }

        let store = self.resolve_store(&mut state, id);
        let key_schema = D::key_schema();
        let entity = Model::entity_def(D::NAME, &key_schema, D::indexes());
        let adapter = store.client.bind(&entity, &store.table);

        let mut hooks = HookSet::new();
        D::hooks(&mut hooks);
        if let Some(extra) = state.extra_hooks.get(&id) {
            hooks.extend(extra);
        }

        let mut model = Model::new(D::NAME, D::schema(), key_schema, adapter)?.with_hooks(hooks);
        if let Some(index) = D::list_index() {
            model = model.with_list_index(index);
        }

        log::info!("📦 Model '{}' bound to table '{}' ({} client)", D::NAME, store.table, store.client.name());
        let model = Arc::new(model);
        state.instances.insert(id, model.clone());
        Ok(model)
    }

    fn resolve_store(&self, state: &mut RegistryState, id: ModelId) -> StoreConfig {
        if let Some(config) = state.overrides.get(&id).or(state.defaults.as_ref()) {
            return config.clone();
        }
        state
            .fallback
            .get_or_insert_with(|| {
                StoreConfig::new((self.client_factory)(&self.settings), self.settings.table.clone())
            })
            .clone()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
