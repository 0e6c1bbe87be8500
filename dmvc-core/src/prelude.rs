//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use dmvc_core::prelude::*;
//! ```

// === Server builder ===
pub use crate::app::DmvcServer;

// === Configuration ===
pub use crate::config::DmvcConfig;

// === Models ===
pub use crate::model::{HookKind, HookSet, KeyInput, ListIndex, Model, ModelDefinition, ModelRegistry, StoreConfig};
pub use crate::schema::{record, EntitySchema, FieldSpec, FieldType, KeySchema, Record};
pub use crate::storage::{IndexDef, MemoryClient, Page, StorageAdapter, StorageClient};

// === Querying ===
pub use crate::query::{CountResult, QueryService};

// === Controllers and auth ===
pub use crate::auth::{Actor, ActorResolver, AuthGuard, BearerTokenResolver};
pub use crate::controller::{Controller, ControllerOptions, RoleOptions};
pub use crate::http::{ApiRequest, ApiResponse, RouteTable, Router};

// === Errors ===
pub use crate::error::{ModelError, ModelResult};
