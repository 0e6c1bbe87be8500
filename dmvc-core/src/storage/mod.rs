//! Storage adapter contract
//!
//! The model layer never talks to a database directly. It is bound to one
//! [`StorageAdapter`] per entity, obtained from a [`StorageClient`] and a table
//! name. Adapters page through results with opaque string cursors: a cursor
//! returned with one page resumes the identical sequence on the next call.

pub mod memory;

pub use memory::{MemoryAdapter, MemoryClient};

use crate::error::StorageError;
use crate::schema::Record;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// One page of results and the cursor to resume from, if more may exist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl Page {
    pub fn new(data: Vec<Record>, cursor: Option<String>) -> Self {
        Self { data, cursor }
    }
}

impl From<Page> for Value {
    fn from(page: Page) -> Self {
        let mut body = Record::new();
        body.insert("data".into(), Value::Array(page.data.into_iter().map(Value::Object).collect()));
        if let Some(cursor) = page.cursor {
            body.insert("cursor".into(), Value::String(cursor));
        }
        Value::Object(body)
    }
}

/// Pagination options passed to every listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

impl PageRequest {
    pub fn new(cursor: Option<String>, limit: usize) -> Self {
        Self { cursor, limit: Some(limit) }
    }

    /// Start from the beginning with the adapter's own page size
    pub fn first() -> Self {
        Self::default()
    }
}

/// What a delete removed; adapters may report one record or several
#[derive(Debug, Clone, PartialEq)]
pub enum Removed {
    Nothing,
    One(Record),
    Many(Vec<Record>),
}

impl Removed {
    pub fn into_vec(self) -> Vec<Record> {
        match self {
            Removed::Nothing => Vec::new(),
            Removed::One(record) => vec![record],
            Removed::Many(records) => records,
        }
    }
}

/// Named secondary access pattern over a subset of fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub fields: Vec<String>,
}

impl IndexDef {
    pub fn new(name: impl Into<String>, fields: &[&str]) -> Self {
        Self { name: name.into(), fields: fields.iter().map(|f| f.to_string()).collect() }
    }
}

/// What an adapter needs to know about the entity it serves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDef {
    pub name: String,
    pub key_fields: Vec<String>,
    pub indexes: Vec<IndexDef>,
}

/// Per-entity storage operations consumed by the base model
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Look up a record by its full key
    async fn get(&self, key: &Record) -> Result<Option<Record>, StorageError>;

    /// Write a full record, replacing any record with the same key
    async fn put(&self, record: Record) -> Result<Record, StorageError>;

    /// Merge `changes` into the record addressed by `key` and return the result
    async fn patch(&self, key: &Record, changes: Record) -> Result<Record, StorageError>;

    async fn delete(&self, key: &Record) -> Result<Removed, StorageError>;

    /// Unordered scan over every record
    async fn scan(&self, page: PageRequest) -> Result<Page, StorageError>;

    /// Facet query, letting the adapter pick the best index for the facets
    async fn find(&self, facets: &Record, page: PageRequest) -> Result<Page, StorageError>;

    /// Facet query that filters on every supplied attribute
    async fn match_facets(&self, facets: &Record, page: PageRequest) -> Result<Page, StorageError>;

    /// Query a named index directly
    async fn query_index(
        &self,
        index: &str,
        _facets: &Record,
        _page: PageRequest,
    ) -> Result<Page, StorageError> {
        Err(StorageError::UnknownIndex(index.to_string()))
    }
}

/// Database handle that can bind entities to tables
pub trait StorageClient: Send + Sync {
    fn bind(&self, entity: &EntityDef, table: &str) -> Arc<dyn StorageAdapter>;

    /// Human readable name used in logs
    fn name(&self) -> &str {
        "custom"
    }
}
