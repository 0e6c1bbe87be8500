//! DMVC Core
//!
//! A schema-validated model layer for key-value stores, with the HTTP
//! plumbing to expose each model as a REST resource.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dmvc_core::prelude::*;
//!
//! struct Todo;
//!
//! impl ModelDefinition for Todo {
//!     const NAME: &'static str = "todo";
//!
//!     fn schema() -> EntitySchema {
//!         EntitySchema::new(vec![
//!             FieldSpec::string("todo"),
//!             FieldSpec::string("title"),
//!             FieldSpec::boolean("done").default_value(false),
//!         ])
//!     }
//!
//!     fn key_schema() -> KeySchema {
//!         KeySchema::new(vec![FieldSpec::string("todo")])
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     DmvcServer::new()
//!         .with_controller::<Todo>(ControllerOptions::new("/todos"))
//!         .serve()
//!         .await
//! }
//! ```
//!
//! # Architecture
//!
//! - [`schema`] - Entity and key schemas, validation and defaults
//! - [`storage`] - Storage adapter contract and the in-memory backend
//! - [`model`] - CRUD, pagination, hooks and the model registry
//! - [`query`] - Query-string driven listing (filters, search, sort, pages)
//! - [`auth`] - Role guards and actor resolution
//! - [`controller`] - REST routes binding a model to a route table
//! - [`http`] - Request/response types, router and hyper server
//! - [`app`] - Server builder (`DmvcServer`)

pub mod app;
pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod logging;
pub mod model;
pub mod query;
pub mod schema;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub mod prelude;

pub use app::DmvcServer;
pub use controller::{Controller, ControllerOptions};
pub use error::{ModelError, ModelResult};
pub use model::{Model, ModelDefinition, ModelRegistry};
pub use schema::Record;
