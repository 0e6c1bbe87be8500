//! DMVC Server - mounts model controllers on a single HTTP server
//!
//! The [`DmvcServer`] ties the pieces together:
//! - configuration loading (`dmvc.toml` + environment)
//! - a shared [`ModelRegistry`]
//! - one [`Controller`] per registered model
//! - actor resolution for the auth guards
//!
//! # Example
//!
//! ```no_run
//! use dmvc_core::app::DmvcServer;
//! use dmvc_core::controller::ControllerOptions;
//! # use dmvc_core::model::ModelDefinition;
//!
//! # async fn example<Todo: ModelDefinition>() -> anyhow::Result<()> {
//! DmvcServer::new()
//!     .with_port(8080)
//!     .with_controller::<Todo>(ControllerOptions::new("/todos"))
//!     .serve()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::auth::{ActorResolver, BearerTokenResolver};
use crate::config::DmvcConfig;
use crate::controller::{Controller, ControllerOptions};
use crate::http::{HttpServer, Router};
use crate::logging::init_logging;
use crate::model::{Model, ModelDefinition, ModelRegistry, DEFAULT_LIMIT};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Resolves a model instance from the registry once the server starts
pub type ModelFactory = Arc<dyn Fn(Arc<ModelRegistry>) -> BoxFuture<'static, Result<Arc<Model>>> + Send + Sync>;

/// Controller registration, resolved lazily from the registry
pub struct ControllerRegistration {
    pub name: &'static str,
    pub options: ControllerOptions,
    pub factory: ModelFactory,
}

/// Multi-model DMVC server
pub struct DmvcServer {
    config: DmvcConfig,
    registry: Option<Arc<ModelRegistry>>,
    resolver: Option<Arc<dyn ActorResolver>>,
    controllers: Vec<ControllerRegistration>,
}

impl DmvcServer {
    /// Create a server with configuration loaded from defaults, `dmvc.toml`
    /// and environment variables
    ///
    /// A config file that fails to parse is logged and ignored.
    pub fn new() -> Self {
        let config = match DmvcConfig::load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load configuration, using defaults: {:#}", e);
                let mut config = DmvcConfig::default();
                config.apply_env_vars();
                config
            }
        };
        Self::with_config(config)
    }

    /// Create a server with an explicit configuration
    pub fn with_config(config: DmvcConfig) -> Self {
        Self { config, registry: None, resolver: None, controllers: Vec::new() }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.config.server.max_body_size = size;
        self
    }

    pub fn with_skip_auth(mut self, skip: bool) -> Self {
        self.config.auth.skip_auth = skip;
        self
    }

    /// Share a registry configured elsewhere (stores, hooks)
    ///
    /// Without one, a registry is built from the `[storage]` section.
    pub fn with_registry(mut self, registry: Arc<ModelRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the default bearer-token resolver built from `[auth.tokens]`
    pub fn with_actor_resolver(mut self, resolver: Arc<dyn ActorResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Mount a CRUD controller for `D`
    pub fn with_controller<D: ModelDefinition>(mut self, options: ControllerOptions) -> Self {
        let factory: ModelFactory = Arc::new(|registry: Arc<ModelRegistry>| {
            Box::pin(async move { registry.model::<D>().await.map_err(anyhow::Error::from) })
        });

        self.controllers.push(ControllerRegistration {
            name: D::NAME,
            options,
            factory,
        });
        self
    }

    pub fn config(&self) -> &DmvcConfig {
        &self.config
    }

    /// The registry controllers resolve their models from
    pub fn registry(&mut self) -> Arc<ModelRegistry> {
        let settings = self.config.storage.clone();
        self.registry
            .get_or_insert_with(|| Arc::new(ModelRegistry::with_settings(settings)))
            .clone()
    }

    /// Build the route table without binding a socket
    pub async fn router(&mut self) -> Result<Router> {
        let registry = self.registry();

        let mut router = Router::new();
        for registration in &self.controllers {
            log::info!("📦 Mounting controller for model: {}", registration.name);
            let model = (registration.factory)(registry.clone())
                .await
                .with_context(|| format!("Failed to create model {}", registration.name))?;

            let options = self.effective_options(&registration.options);
            log::info!("✅ {} mounted at {}", registration.name, options.base_path);
            Controller::register(&mut router, model, options);
        }

        Ok(router)
    }

    /// Server-wide settings apply where the controller kept the defaults
    fn effective_options(&self, options: &ControllerOptions) -> ControllerOptions {
        let mut options = options.clone();
        if self.config.auth.skip_auth {
            options.skip_auth = true;
        }
        if options.page_size == DEFAULT_LIMIT {
            options.page_size = self.config.query.page_size;
        }
        options
    }

    fn actor_resolver(&self) -> Arc<dyn ActorResolver> {
        match &self.resolver {
            Some(resolver) => resolver.clone(),
            None => Arc::new(BearerTokenResolver::from_config(&self.config.auth)),
        }
    }

    /// Start serving
    pub async fn serve(mut self) -> Result<()> {
        init_logging(&self.config.logging);
        self.config.validate()?;

        let router = self.router().await?;

        log::info!("🚀 Starting DMVC Server");
        log::info!("   Port: {}", self.config.server.port);
        log::info!("   Host: {}", self.config.server.host);
        log::info!("   Table: {}", self.config.storage.table);
        log::info!("   Auth: {}", if self.config.auth.skip_auth { "skipped" } else { "enabled" });
        log::info!("   Controllers: {}", self.controllers.len());
        for route in router.describe() {
            log::debug!("   {}", route);
        }

        HttpServer::new(Arc::new(router))
            .with_resolver(self.actor_resolver())
            .with_max_body_size(self.config.server.max_body_size)
            .serve(&self.config.server.address())
            .await
    }
}

impl Default for DmvcServer {
    fn default() -> Self {
        Self::new()
    }
}
