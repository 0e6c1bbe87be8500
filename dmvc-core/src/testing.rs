//! Shared fixtures for unit tests

use crate::model::{ListIndex, Model, ModelDefinition};
use crate::schema::{record, EntitySchema, FieldSpec, KeySchema, Record};
use crate::storage::{IndexDef, MemoryAdapter};
use serde_json::json;
use std::sync::Arc;

pub fn item_schema() -> EntitySchema {
    EntitySchema::new(vec![
        FieldSpec::string("id"),
        FieldSpec::string("name").optional(),
        FieldSpec::integer("qty").default_value(1),
        FieldSpec::string("createdBy").optional(),
    ])
}

pub fn item_key() -> KeySchema {
    KeySchema::new(vec![FieldSpec::string("id")])
}

pub fn multi_schema() -> EntitySchema {
    EntitySchema::new(vec![
        FieldSpec::string("id"),
        FieldSpec::string("sort"),
        FieldSpec::string("name").optional(),
    ])
}

pub fn multi_key() -> KeySchema {
    KeySchema::new(vec![FieldSpec::string("id"), FieldSpec::string("sort")])
}

/// Single-key model over a fresh adapter capped at `page_cap` items per call
pub fn item_model(page_cap: usize) -> (Model, Arc<MemoryAdapter>) {
    let key = item_key();
    let adapter = Arc::new(
        MemoryAdapter::new(Model::entity_def("item", &key, Vec::new())).with_max_page_size(page_cap),
    );
    let model = Model::new("item", item_schema(), key, adapter.clone()).unwrap();
    (model, adapter)
}

/// Composite-key (`id` + `sort`) model over a fresh adapter
pub fn composite_model() -> (Model, Arc<MemoryAdapter>) {
    let key = multi_key();
    let adapter = Arc::new(MemoryAdapter::new(Model::entity_def("multi", &key, Vec::new())));
    let model = Model::new("multi", multi_schema(), key, adapter.clone()).unwrap();
    (model, adapter)
}

/// Records `{id: "<index>", name}` for each name
pub fn seeded_items(names: &[&str]) -> Vec<Record> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| record([("id", json!(i.to_string())), ("name", json!(name))]))
        .collect()
}

pub struct ItemModel;

impl ModelDefinition for ItemModel {
    const NAME: &'static str = "item";

    fn schema() -> EntitySchema {
        item_schema()
    }

    fn key_schema() -> KeySchema {
        item_key()
    }
}

pub struct MultiModel;

impl ModelDefinition for MultiModel {
    const NAME: &'static str = "multi";

    fn schema() -> EntitySchema {
        multi_schema()
    }

    fn key_schema() -> KeySchema {
        multi_key()
    }

    fn indexes() -> Vec<IndexDef> {
        vec![IndexDef::new("bySort", &["sort"])]
    }

    fn list_index() -> Option<ListIndex> {
        Some(ListIndex::new("bySort"))
    }
}
