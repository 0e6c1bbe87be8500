//! Compile-time model definitions

use super::{HookSet, ListIndex};
use crate::schema::{EntitySchema, KeySchema};
use crate::storage::IndexDef;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Describes one model type: its schemas, indexes and definition-time hooks.
///
/// ```rust,ignore
/// struct Todo;
///
/// impl ModelDefinition for Todo {
///     const NAME: &'static str = "todo";
///
///     fn schema() -> EntitySchema {
///         EntitySchema::new(vec![FieldSpec::string("todo"), FieldSpec::string("title")])
///     }
///
///     fn key_schema() -> KeySchema {
///         KeySchema::new(vec![FieldSpec::string("todo")])
///     }
/// }
/// ```
pub trait ModelDefinition: Send + Sync + 'static {
    /// Entity name, used in logs and as the storage entity name
    const NAME: &'static str;

    fn schema() -> EntitySchema;

    fn key_schema() -> KeySchema;

    /// Secondary indexes the storage adapter should expose
    fn indexes() -> Vec<IndexDef> {
        Vec::new()
    }

    /// Static index used for unfiltered, unsorted listing
    fn list_index() -> Option<ListIndex> {
        None
    }

    /// Register hooks that every instance of this model runs
    fn hooks(_hooks: &mut HookSet) {}
}

/// Identity of a model definition, independent of its display name
#[derive(Clone, Copy)]
pub struct ModelId {
    type_id: TypeId,
    name: &'static str,
}

impl ModelId {
    pub fn of<D: ModelDefinition>() -> Self {
        Self { type_id: TypeId::of::<D>(), name: D::NAME }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ModelId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ModelId {}

impl Hash for ModelId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({})", self.name)
    }
}
