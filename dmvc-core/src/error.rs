//! Error taxonomy shared by the model, storage and controller layers.

use http::StatusCode;
use serde::Serialize;

/// A single schema violation, addressed by field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

/// Input did not conform to an entity or key schema.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("validation failed: {}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { issues: vec![FieldIssue::new(path, message)] }
    }
}

fn summarize(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| if i.path.is_empty() { i.message.clone() } else { format!("{}: {}", i.path, i.message) })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Model definition is internally inconsistent (detected at construction).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Key field '{0}' is not declared in the entity schema")]
    MissingKeyField(String),
    #[error("Key field '{field}' is declared as {key_type} but the entity declares {entity_type}")]
    IncompatibleKeyField { field: String, key_type: String, entity_type: String },
    #[error("Key schema must declare at least one field")]
    EmptyKey,
}

/// Failures reported by a storage adapter.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Record not found")]
    NotFound,
    #[error("Unknown index: {0}")]
    UnknownIndex(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by base model operations.
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Hook failed: {0}")]
    Hook(anyhow::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ModelError {
    /// HTTP status this error maps to at the controller boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            ModelError::Validation(_) | ModelError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            ModelError::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            ModelError::Storage(StorageError::InvalidCursor(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::Validation(_) => "validation_error",
            ModelError::InvalidKey(_) => "invalid_key",
            ModelError::Storage(StorageError::NotFound) => "not_found",
            ModelError::Storage(StorageError::InvalidCursor(_)) => "invalid_cursor",
            ModelError::Storage(_) => "storage_error",
            ModelError::Hook(_) => "hook_error",
            ModelError::Schema(_) => "schema_error",
        }
    }
}

/// Convenient alias for model-layer results.
pub type ModelResult<T> = Result<T, ModelError>;
