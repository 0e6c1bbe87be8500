//! Todo Example
//!
//! A todo API served by DMVC over in-memory storage.
//!
//! ## Run
//! ```bash
//! cd demos/todo && SKIP_AUTH=true cargo run
//! ```
//!
//! ## Test
//! ```bash
//! curl -X POST http://localhost:3000/todos \
//!   -H "Content-Type: application/json" \
//!   -d '{"todo": "t1", "title": "Learn DMVC"}'
//!
//! curl "http://localhost:3000/todos?sortField=title&search=learn"
//! curl http://localhost:3000/todos/_count?completed=false
//! curl -X PATCH http://localhost:3000/todos \
//!   -H "Content-Type: application/json" \
//!   -d '{"todo": "t1", "completed": true}'
//! curl -X DELETE http://localhost:3000/todos/t1
//! ```
//!
//! Without `SKIP_AUTH`, requests need `Authorization: Bearer <token>` with a
//! token from the `[auth.tokens]` section of `dmvc.toml`. Deleting needs the
//! admin token.

mod model;

use anyhow::Result;
use dmvc_core::app::DmvcServer;
use dmvc_core::controller::{ControllerOptions, RoleOptions};
use dmvc_core::model::{ModelRegistry, StoreConfig};
use dmvc_core::storage::MemoryClient;
use model::TodoModel;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let server = DmvcServer::new();

    let registry = Arc::new(ModelRegistry::with_settings(server.config().storage.clone()));
    let table = server.config().storage.table.clone();
    registry.configure(StoreConfig::new(Arc::new(MemoryClient::new()), table)).await;

    let roles = RoleOptions { delete: vec!["admin".into()], ..RoleOptions::default() };

    server
        .with_registry(registry)
        .with_controller::<TodoModel>(ControllerOptions::new("/todos").with_roles(roles))
        .serve()
        .await
}
