//! The todo model: composite key `todo` + `type`, where `type` is always "todo"

use dmvc_core::model::{HookKind, HookSet, ListIndex, ModelDefinition};
use dmvc_core::schema::{record, EntitySchema, FieldSpec, KeySchema};
use dmvc_core::storage::IndexDef;
use serde_json::json;

pub struct TodoModel;

impl ModelDefinition for TodoModel {
    const NAME: &'static str = "Todo";

    fn schema() -> EntitySchema {
        EntitySchema::new(vec![
            FieldSpec::string("todo"),
            FieldSpec::string("title"),
            FieldSpec::boolean("completed").default_value(false),
            FieldSpec::literal("type", "todo").default_value("todo"),
            FieldSpec::string("createdBy").optional(),
        ])
    }

    fn key_schema() -> KeySchema {
        KeySchema::new(vec![
            FieldSpec::string("todo"),
            FieldSpec::literal("type", "todo").default_value("todo"),
        ])
    }

    fn indexes() -> Vec<IndexDef> {
        vec![
            IndexDef::new("byType", &["type"]),
            IndexDef::new("byTitle", &["title"]),
            IndexDef::new("byCompleted", &["completed"]),
        ]
    }

    fn list_index() -> Option<ListIndex> {
        Some(ListIndex::new("byType").with_facets(record([("type", json!("todo"))])))
    }

    fn hooks(hooks: &mut HookSet) {
        hooks.add(HookKind::AfterCreate, |todo| async move {
            log::info!("📝 Created todo {}", todo.get("todo").and_then(|v| v.as_str()).unwrap_or("?"));
            Ok(())
        });
    }
}
