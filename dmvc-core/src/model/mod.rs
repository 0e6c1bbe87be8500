//! Base model: generic CRUD over one storage adapter
//!
//! A [`Model`] pairs an [`EntitySchema`] and [`KeySchema`] with the
//! [`StorageAdapter`] bound for its entity. Every write goes through schema
//! validation and the model's [`HookSet`]; reads are thin pass-throughs that
//! normalize pagination. Models hold no record state between calls.
//!
//! Models are usually obtained from a [`ModelRegistry`] through a
//! [`ModelDefinition`] rather than constructed by hand.

pub mod definition;
pub mod hooks;
pub mod registry;

pub use definition::{ModelDefinition, ModelId};
pub use hooks::{Hook, HookKind, HookSet};
pub use registry::{ModelRegistry, StoreConfig};

use crate::error::{ModelError, ModelResult, SchemaError};
use crate::schema::{EntitySchema, FieldType, KeySchema, Record};
use crate::storage::{EntityDef, IndexDef, Page, PageRequest, StorageAdapter};
use serde_json::Value;
use std::sync::Arc;

/// Page size used when a caller does not ask for one
pub const DEFAULT_LIMIT: usize = 10;

/// Static index the query service may list from directly
#[derive(Debug, Clone, PartialEq)]
pub struct ListIndex {
    pub name: String,
    pub facets: Record,
}

impl ListIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), facets: Record::new() }
    }

    pub fn with_facets(mut self, facets: Record) -> Self {
        self.facets = facets;
        self
    }
}

/// Key addressing a record: either a full key record or a bare identifier
#[derive(Debug, Clone, PartialEq)]
pub enum KeyInput {
    Id(Value),
    Key(Record),
}

impl From<&str> for KeyInput {
    fn from(id: &str) -> Self {
        KeyInput::Id(Value::String(id.to_string()))
    }
}

impl From<String> for KeyInput {
    fn from(id: String) -> Self {
        KeyInput::Id(Value::String(id))
    }
}

impl From<i64> for KeyInput {
    fn from(id: i64) -> Self {
        KeyInput::Id(Value::from(id))
    }
}

impl From<Record> for KeyInput {
    fn from(key: Record) -> Self {
        KeyInput::Key(key)
    }
}

impl From<&Record> for KeyInput {
    fn from(key: &Record) -> Self {
        KeyInput::Key(key.clone())
    }
}

/// Adapter-bound model instance
pub struct Model {
    name: String,
    schema: EntitySchema,
    key_schema: KeySchema,
    adapter: Arc<dyn StorageAdapter>,
    hooks: HookSet,
    list_index: Option<ListIndex>,
}

impl Model {
    /// Build a model, checking that the key schema is a subset of the entity schema
    pub fn new(
        name: impl Into<String>,
        schema: EntitySchema,
        key_schema: KeySchema,
        adapter: Arc<dyn StorageAdapter>,
    ) -> Result<Self, SchemaError> {
        key_schema.check_against(&schema)?;
        Ok(Self {
            name: name.into(),
            schema,
            key_schema,
            adapter,
            hooks: HookSet::new(),
            list_index: None,
        })
    }

    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_list_index(mut self, index: ListIndex) -> Self {
        self.list_index = Some(index);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn key_schema(&self) -> &KeySchema {
        &self.key_schema
    }

    pub fn key_names(&self) -> Vec<String> {
        self.key_schema.key_names()
    }

    pub fn list_index(&self) -> Option<&ListIndex> {
        self.list_index.as_ref()
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    /// Storage-facing description of this entity
    pub fn entity_def(name: &str, key_schema: &KeySchema, indexes: Vec<IndexDef>) -> EntityDef {
        EntityDef { name: name.to_string(), key_fields: key_schema.key_names(), indexes }
    }

    /// Validate `data`, run create hooks around the write, return the stored record
    pub async fn create(&self, data: &Value) -> ModelResult<Record> {
        let record = self.schema.parse(data)?;
        self.hooks.run(HookKind::BeforeCreate, &record).await?;

        let written = self.adapter.put(record).await?;
        log::debug!("{}: created record", self.name);

        self.hooks.run(HookKind::AfterCreate, &written).await?;
        Ok(written)
    }

    /// Look up a record by key; absence is `Ok(None)`
    pub async fn get(&self, key: impl Into<KeyInput>) -> ModelResult<Option<Record>> {
        let key = self.resolve_key(key.into(), "lookup")?;
        Ok(self.adapter.get(&key).await?)
    }

    /// Merge a partial record into the stored one addressed by its key fields
    pub async fn update(&self, data: &Value) -> ModelResult<Record> {
        let validated = self.schema.parse_partial(data)?;
        let key = self.key_schema.parse(&Value::Object(validated.clone()))?;

        let changes: Record = validated.into_iter().filter(|(field, _)| !key.contains_key(field)).collect();
        self.hooks.run(HookKind::BeforeUpdate, &changes).await?;

        let merged = self.adapter.patch(&key, changes).await?;
        log::debug!("{}: updated record", self.name);

        self.hooks.run(HookKind::AfterUpdate, &merged).await?;
        Ok(merged)
    }

    /// Delete by full key, or by bare id when the key has a single field.
    ///
    /// Returns every removed record; an empty page means nothing matched.
    pub async fn delete(&self, key: impl Into<KeyInput>) -> ModelResult<Page> {
        let key = self.resolve_key(key.into(), "delete")?;
        self.hooks.run(HookKind::BeforeDelete, &key).await?;

        let removed = self.adapter.delete(&key).await?.into_vec();
        log::debug!("{}: deleted {} record(s)", self.name, removed.len());

        for record in &removed {
            self.hooks.run(HookKind::AfterDelete, record).await?;
        }
        Ok(Page::new(removed, None))
    }

    /// Accumulate up to `limit` scanned items, following adapter cursors
    pub async fn list(&self, cursor: Option<String>, limit: usize) -> ModelResult<Page> {
        let mut items = Vec::new();
        let mut next = cursor;
        loop {
            let remaining = limit.saturating_sub(items.len());
            let page = self
                .adapter
                .scan(PageRequest { cursor: next.take(), limit: (remaining > 0).then_some(remaining) })
                .await?;
            items.extend(page.data);
            next = page.cursor;
            if items.len() >= limit || next.is_none() {
                break;
            }
        }
        items.truncate(limit);
        Ok(Page::new(items, next))
    }

    pub async fn find(&self, facets: &Record, cursor: Option<String>, limit: usize) -> ModelResult<Page> {
        Ok(self.adapter.find(facets, PageRequest::new(cursor, limit)).await?)
    }

    pub async fn match_facets(
        &self,
        facets: &Record,
        cursor: Option<String>,
        limit: usize,
    ) -> ModelResult<Page> {
        Ok(self.adapter.match_facets(facets, PageRequest::new(cursor, limit)).await?)
    }

    /// Page through a named index
    pub async fn query_index(
        &self,
        index: &str,
        facets: &Record,
        cursor: Option<String>,
        limit: usize,
    ) -> ModelResult<Page> {
        Ok(self.adapter.query_index(index, facets, PageRequest::new(cursor, limit)).await?)
    }

    /// Count matching records by draining every page
    pub async fn count(&self, facets: &Record) -> ModelResult<usize> {
        let mut total = 0;
        let mut cursor = None;
        loop {
            let request = PageRequest { cursor: cursor.take(), limit: None };
            let page = if facets.is_empty() {
                self.adapter.scan(request).await?
            } else {
                self.adapter.match_facets(facets, request).await?
            };
            total += page.data.len();
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(total)
    }

    /// Every record, in scan order
    pub async fn list_all(&self) -> ModelResult<Vec<Record>> {
        let mut items = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.list(cursor, DEFAULT_LIMIT).await?;
            items.extend(page.data);
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(items)
    }

    /// Every record matching `facets`
    pub async fn match_all(&self, facets: &Record) -> ModelResult<Vec<Record>> {
        let mut items = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.match_facets(facets, cursor, DEFAULT_LIMIT).await?;
            items.extend(page.data);
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(items)
    }

    fn resolve_key(&self, key: KeyInput, operation: &str) -> ModelResult<Record> {
        let fields = self.key_schema.fields();
        let raw = match key {
            KeyInput::Key(record) => record,
            KeyInput::Id(id) => {
                let [field] = fields else {
                    return Err(ModelError::InvalidKey(format!(
                        "Composite key {operation} requires an object containing all key attributes"
                    )));
                };
                let value = match (&id, &field.ty) {
                    (Value::String(raw), ty) if *ty != FieldType::String => ty.coerce_str(raw),
                    _ => None,
                }
                .unwrap_or(id);
                let mut record = Record::new();
                record.insert(field.name.clone(), value);
                record
            }
        };
        Ok(self.key_schema.parse(&Value::Object(raw))?)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("keys", &self.key_names())
            .field("list_index", &self.list_index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{record, FieldSpec};
    use crate::storage::MemoryAdapter;
    use crate::testing::{composite_model, item_model, item_schema, seeded_items};
    use serde_json::json;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_create_then_get_returns_defaults() {
        let (model, _) = item_model(50);
        let created = model.create(&json!({"id": "1", "name": "x"})).await.unwrap();
        assert_eq!(created["qty"], json!(1));

        let fetched = model.get("1").await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(model.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_record() {
        let (model, adapter) = item_model(50);
        let err = model.create(&json!({"name": 3})).await.unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));
        assert!(adapter.is_empty().await);
    }

    #[test]
    fn test_new_enforces_key_subset() {
        let adapter = Arc::new(MemoryAdapter::new(EntityDef {
            name: "item".into(),
            key_fields: vec!["sku".into()],
            indexes: vec![],
        }));
        let err = Model::new("item", item_schema(), KeySchema::new(vec![FieldSpec::string("sku")]), adapter)
            .unwrap_err();
        assert_eq!(err, SchemaError::MissingKeyField("sku".into()));
    }

    #[tokio::test]
    async fn test_update_merges_and_excludes_key_from_changes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let mut hooks = HookSet::new();
        hooks.add(HookKind::BeforeUpdate, move |changes| {
            let captured = captured.clone();
            async move {
                captured.lock().unwrap().push(changes);
                Ok(())
            }
        });
        let (model, _) = item_model(50);
        let model = model.with_hooks(hooks);
        model.create(&json!({"id": "1", "name": "a", "qty": 4})).await.unwrap();

        let merged = model.update(&json!({"id": "1", "name": "b"})).await.unwrap();
        assert_eq!(merged["name"], json!("b"));
        assert_eq!(merged["qty"], json!(4));
        assert_eq!(seen.lock().unwrap()[0], record([("name", json!("b"))]));
    }

    #[tokio::test]
    async fn test_update_without_key_is_validation_error() {
        let (model, _) = item_model(50);
        let err = model.update(&json!({"name": "b"})).await.unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let (model, _) = item_model(50);
        let err = model.update(&json!({"id": "nope", "name": "b"})).await.unwrap_err();
        assert_eq!(err.status(), http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_by_id_and_missing_key() {
        let (model, adapter) = item_model(50);
        adapter.seed(seeded_items(&["a"])).await;

        let removed = model.delete("0").await.unwrap();
        assert_eq!(removed.data.len(), 1);
        assert!(removed.cursor.is_none());

        let again = model.delete("0").await.unwrap();
        assert!(again.data.is_empty());
    }

    #[tokio::test]
    async fn test_composite_delete_requires_full_key() {
        let (model, adapter) = composite_model();
        adapter.seed([record([("id", json!("1")), ("sort", json!("A")), ("name", json!("a"))])]).await;

        let err = model.delete("1").await.unwrap_err();
        match err {
            ModelError::InvalidKey(msg) => {
                assert_eq!(msg, "Composite key delete requires an object containing all key attributes")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let removed = model.delete(record([("id", json!("1")), ("sort", json!("A"))])).await.unwrap();
        assert_eq!(removed.data[0]["name"], json!("a"));
    }

    #[tokio::test]
    async fn test_delete_hooks_see_key_then_each_record() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = HookSet::new();
        for kind in [HookKind::BeforeDelete, HookKind::AfterDelete] {
            let log = log.clone();
            hooks.add(kind, move |payload| {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push((kind, payload.len()));
                    Ok(())
                }
            });
        }
        let (model, adapter) = item_model(50);
        let model = model.with_hooks(hooks);
        adapter.seed(seeded_items(&["a"])).await;

        model.delete("0").await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec![(HookKind::BeforeDelete, 1), (HookKind::AfterDelete, 2)]);
    }

    #[tokio::test]
    async fn test_before_create_hook_failure_prevents_write() {
        let mut hooks = HookSet::new();
        hooks.add(HookKind::BeforeCreate, |_| async { Err::<(), _>(anyhow::anyhow!("nope")) });
        let (model, adapter) = item_model(50);
        let model = model.with_hooks(hooks);

        assert!(matches!(model.create(&json!({"id": "1"})).await, Err(ModelError::Hook(_))));
        assert!(adapter.is_empty().await);
    }

    #[tokio::test]
    async fn test_after_create_hook_failure_leaves_write_committed() {
        let mut hooks = HookSet::new();
        hooks.add(HookKind::AfterCreate, |_| async { Err::<(), _>(anyhow::anyhow!("notify failed")) });
        let (model, adapter) = item_model(50);
        let model = model.with_hooks(hooks);

        assert!(model.create(&json!({"id": "1"})).await.is_err());
        assert_eq!(adapter.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_accumulates_across_short_pages() {
        let (model, adapter) = item_model(3);
        adapter.seed(seeded_items(&["a", "b", "c", "d", "e", "f", "g"])).await;

        let page = model.list(None, 5).await.unwrap();
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.cursor.as_deref(), Some("5"));

        let rest = model.list(page.cursor, 5).await.unwrap();
        assert_eq!(rest.data.len(), 2);
        assert!(rest.cursor.is_none());
    }

    #[tokio::test]
    async fn test_count_matches_list_all_for_any_size() {
        for size in [0usize, 1, 10, 11, 23] {
            let (model, adapter) = item_model(4);
            let names: Vec<String> = (0..size).map(|i| format!("n{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            adapter.seed(seeded_items(&refs)).await;

            let all = model.list_all().await.unwrap();
            assert_eq!(all.len(), size);
            assert_eq!(model.count(&Record::new()).await.unwrap(), size);
        }
    }

    #[tokio::test]
    async fn test_match_all_and_count_with_facets() {
        let (model, adapter) = item_model(2);
        adapter.seed(seeded_items(&["a", "b", "a", "a", "c"])).await;
        let facets = record([("name", json!("a"))]);

        assert_eq!(model.match_all(&facets).await.unwrap().len(), 3);
        assert_eq!(model.count(&facets).await.unwrap(), 3);
        let first = model.find(&facets, None, 1).await.unwrap();
        assert_eq!(first.data.len(), 1);
        assert!(first.cursor.is_some());
    }
}
