//! In-memory storage adapter
//!
//! Records live in an insertion-ordered `Vec` behind a tokio `RwLock`.
//! Suitable for tests, demos and local development; data is lost on restart.
//! Cursors are numeric offsets into the filtered sequence, and every call is
//! capped at `max_page_size` items so callers must follow cursors the same
//! way they would against a real document store.

use super::{EntityDef, Page, PageRequest, Removed, StorageAdapter, StorageClient};
use crate::error::StorageError;
use crate::schema::Record;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Default per-call page cap
pub const DEFAULT_MAX_PAGE_SIZE: usize = 50;

/// Storage for a single entity
pub struct MemoryAdapter {
    entity: EntityDef,
    records: RwLock<Vec<Record>>,
    max_page_size: usize,
}

impl MemoryAdapter {
    pub fn new(entity: EntityDef) -> Self {
        Self { entity, records: RwLock::new(Vec::new()), max_page_size: DEFAULT_MAX_PAGE_SIZE }
    }

    /// Cap the number of items any single call returns
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    /// Insert records directly, bypassing validation
    pub async fn seed(&self, records: impl IntoIterator<Item = Record>) {
        let mut stored = self.records.write().await;
        for record in records {
            upsert(&self.entity, &mut stored, record);
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn require_key(&self, key: &Record) -> Result<(), StorageError> {
        match self.entity.key_fields.iter().find(|f| !key.contains_key(*f)) {
            Some(missing) => Err(StorageError::Backend(format!(
                "Incomplete key for {}: missing '{}'",
                self.entity.name, missing
            ))),
            None => Ok(()),
        }
    }

    fn paginate(&self, items: Vec<Record>, page: PageRequest) -> Result<Page, StorageError> {
        let offset = match page.cursor.as_deref() {
            None | Some("") => 0,
            Some(raw) => raw.parse::<usize>().map_err(|_| StorageError::InvalidCursor(raw.to_string()))?,
        };
        let limit = page.limit.unwrap_or(self.max_page_size).clamp(1, self.max_page_size);
        let end = offset.saturating_add(limit).min(items.len());
        let data = if offset < items.len() { items[offset..end].to_vec() } else { Vec::new() };
        let cursor = (end < items.len()).then(|| end.to_string());
        Ok(Page { data, cursor })
    }

    async fn filtered(&self, facets: &Record) -> Vec<Record> {
        self.records.read().await.iter().filter(|r| matches_facets(r, facets)).cloned().collect()
    }
}

fn matches_facets(record: &Record, facets: &Record) -> bool {
    facets.iter().all(|(k, v)| record.get(k) == Some(v))
}

fn same_key(entity: &EntityDef, a: &Record, b: &Record) -> bool {
    entity.key_fields.iter().all(|f| a.get(f).is_some() && a.get(f) == b.get(f))
}

fn upsert(entity: &EntityDef, stored: &mut Vec<Record>, record: Record) {
    match stored.iter_mut().find(|r| same_key(entity, r, &record)) {
        Some(existing) => *existing = record,
        None => stored.push(record),
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    async fn get(&self, key: &Record) -> Result<Option<Record>, StorageError> {
        self.require_key(key)?;
        let stored = self.records.read().await;
        Ok(stored.iter().find(|r| same_key(&self.entity, key, r)).cloned())
    }

    async fn put(&self, record: Record) -> Result<Record, StorageError> {
        self.require_key(&record)?;
        let mut stored = self.records.write().await;
        upsert(&self.entity, &mut stored, record.clone());
        Ok(record)
    }

    async fn patch(&self, key: &Record, changes: Record) -> Result<Record, StorageError> {
        self.require_key(key)?;
        let mut stored = self.records.write().await;
        let existing = stored
            .iter_mut()
            .find(|r| same_key(&self.entity, key, r))
            .ok_or(StorageError::NotFound)?;
        for (field, value) in changes {
            existing.insert(field, value);
        }
        Ok(existing.clone())
    }

    async fn delete(&self, key: &Record) -> Result<Removed, StorageError> {
        self.require_key(key)?;
        let mut stored = self.records.write().await;
        match stored.iter().position(|r| same_key(&self.entity, key, r)) {
            Some(idx) => Ok(Removed::One(stored.remove(idx))),
            None => Ok(Removed::Nothing),
        }
    }

    async fn scan(&self, page: PageRequest) -> Result<Page, StorageError> {
        let items = self.records.read().await.clone();
        self.paginate(items, page)
    }

    async fn find(&self, facets: &Record, page: PageRequest) -> Result<Page, StorageError> {
        let items = self.filtered(facets).await;
        self.paginate(items, page)
    }

    async fn match_facets(&self, facets: &Record, page: PageRequest) -> Result<Page, StorageError> {
        let items = self.filtered(facets).await;
        self.paginate(items, page)
    }

    async fn query_index(
        &self,
        index: &str,
        facets: &Record,
        page: PageRequest,
    ) -> Result<Page, StorageError> {
        let def = self
            .entity
            .indexes
            .iter()
            .find(|i| i.name == index)
            .ok_or_else(|| StorageError::UnknownIndex(index.to_string()))?;
        // Records missing an index attribute are not projected into the index
        let items = self
            .filtered(facets)
            .await
            .into_iter()
            .filter(|r| def.fields.iter().all(|f| r.get(f).is_some_and(|v| !v.is_null())))
            .collect();
        self.paginate(items, page)
    }
}

/// In-process "database" handing out one [`MemoryAdapter`] per table and entity
#[derive(Clone)]
pub struct MemoryClient {
    tables: Arc<Mutex<HashMap<(String, String), Arc<MemoryAdapter>>>>,
    max_page_size: usize,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self { tables: Arc::new(Mutex::new(HashMap::new())), max_page_size: DEFAULT_MAX_PAGE_SIZE }
    }

    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    /// Typed handle to the adapter bound for `(table, entity)`, creating it if needed
    pub fn adapter(&self, entity: &EntityDef, table: &str) -> Arc<MemoryAdapter> {
        let mut tables = self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        tables
            .entry((table.to_string(), entity.name.clone()))
            .or_insert_with(|| {
                Arc::new(MemoryAdapter::new(entity.clone()).with_max_page_size(self.max_page_size))
            })
            .clone()
    }
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageClient for MemoryClient {
    fn bind(&self, entity: &EntityDef, table: &str) -> Arc<dyn StorageAdapter> {
        self.adapter(entity, table)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::record;
    use crate::storage::IndexDef;
    use serde_json::json;

    fn entity() -> EntityDef {
        EntityDef {
            name: "item".into(),
            key_fields: vec!["id".into()],
            indexes: vec![IndexDef::new("byOwner", &["owner"])],
        }
    }

    async fn seeded(n: usize, cap: usize) -> MemoryAdapter {
        let adapter = MemoryAdapter::new(entity()).with_max_page_size(cap);
        adapter
            .seed((0..n).map(|i| record([("id", json!(i.to_string())), ("n", json!(i))])))
            .await;
        adapter
    }

    #[tokio::test]
    async fn test_put_get_patch_delete() {
        let adapter = MemoryAdapter::new(entity());
        adapter.put(record([("id", json!("1")), ("name", json!("a"))])).await.unwrap();

        let key = record([("id", json!("1"))]);
        let got = adapter.get(&key).await.unwrap().unwrap();
        assert_eq!(got["name"], json!("a"));

        let patched = adapter.patch(&key, record([("done", json!(true))])).await.unwrap();
        assert_eq!(patched["name"], json!("a"));
        assert_eq!(patched["done"], json!(true));

        assert_eq!(adapter.delete(&key).await.unwrap().into_vec().len(), 1);
        assert_eq!(adapter.delete(&key).await.unwrap(), Removed::Nothing);
        assert!(adapter.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_patch_missing_record_is_not_found() {
        let adapter = MemoryAdapter::new(entity());
        let err = adapter.patch(&record([("id", json!("x"))]), Record::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_incomplete_key_is_rejected() {
        let adapter = MemoryAdapter::new(entity());
        assert!(adapter.get(&Record::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_scan_caps_page_and_resumes_from_cursor() {
        let adapter = seeded(7, 3).await;

        let first = adapter.scan(PageRequest::new(None, 10)).await.unwrap();
        assert_eq!(first.data.len(), 3);
        assert_eq!(first.cursor.as_deref(), Some("3"));

        let second = adapter.scan(PageRequest::new(first.cursor, 10)).await.unwrap();
        assert_eq!(second.data[0]["id"], json!("3"));

        let last = adapter.scan(PageRequest::new(Some("6".into()), 10)).await.unwrap();
        assert_eq!(last.data.len(), 1);
        assert!(last.cursor.is_none());
    }

    #[tokio::test]
    async fn test_invalid_cursor() {
        let adapter = seeded(2, 5).await;
        let err = adapter.scan(PageRequest::new(Some("abc".into()), 1)).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidCursor(_)));
    }

    #[tokio::test]
    async fn test_cursor_past_end_yields_empty_last_page() {
        let adapter = seeded(2, 5).await;
        let page = adapter.scan(PageRequest::new(Some(u64::MAX.to_string()), 5)).await.unwrap();
        assert!(page.data.is_empty());
        assert!(page.cursor.is_none());

        let page = adapter.scan(PageRequest::new(Some(usize::MAX.to_string()), usize::MAX)).await.unwrap();
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn test_query_index_filters_and_rejects_unknown() {
        let adapter = MemoryAdapter::new(entity());
        adapter
            .seed([
                record([("id", json!("1")), ("owner", json!("u1"))]),
                record([("id", json!("2"))]),
                record([("id", json!("3")), ("owner", json!("u2"))]),
            ])
            .await;

        let all = adapter.query_index("byOwner", &Record::new(), PageRequest::first()).await.unwrap();
        assert_eq!(all.data.len(), 2);

        let mine = adapter
            .query_index("byOwner", &record([("owner", json!("u2"))]), PageRequest::first())
            .await
            .unwrap();
        assert_eq!(mine.data[0]["id"], json!("3"));

        let err = adapter.query_index("nope", &Record::new(), PageRequest::first()).await.unwrap_err();
        assert!(matches!(err, StorageError::UnknownIndex(_)));
    }

    #[tokio::test]
    async fn test_client_rebinding_shares_data() {
        let client = MemoryClient::new();
        let a = client.bind(&entity(), "t");
        a.put(record([("id", json!("1"))])).await.unwrap();

        let b = client.bind(&entity(), "t");
        assert!(b.get(&record([("id", json!("1"))])).await.unwrap().is_some());

        let other_table = client.bind(&entity(), "u");
        assert!(other_table.get(&record([("id", json!("1"))])).await.unwrap().is_none());
    }
}
