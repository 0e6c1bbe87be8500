//! Query service: list/count over a model from raw query parameters
//!
//! Plain listing is delegated to the model and keeps adapter-native cursors.
//! When a request asks for sorting or free-text search the whole (filtered)
//! collection is drained into memory, searched, sorted and sliced by page;
//! the returned cursor is then the next page number.

pub mod intent;

pub use intent::{QueryIntent, QueryParams, SortDir, CONTROL_PARAMS};

use crate::error::ModelResult;
use crate::model::Model;
use crate::schema::Record;
use crate::storage::Page;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Body returned by count endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResult {
    pub total: usize,
}

pub struct QueryService {
    model: Arc<Model>,
    page_size: usize,
}

impl QueryService {
    pub fn new(model: Arc<Model>, page_size: usize) -> Self {
        Self { model, page_size: page_size.max(1) }
    }

    pub fn intent(&self, params: &QueryParams) -> QueryIntent {
        let mut intent = QueryIntent::parse(params, self.page_size);
        intent.filters = self.model.schema().coerce_facets(intent.filters);
        intent
    }

    pub async fn list(&self, params: &QueryParams) -> ModelResult<Page> {
        let intent = self.intent(params);

        if !intent.needs_full_scan() {
            if let (false, Some(index)) = (intent.has_filters(), self.model.list_index()) {
                return self.model.query_index(&index.name, &index.facets, intent.cursor, intent.limit).await;
            }
            return if intent.has_filters() {
                self.model.match_facets(&intent.filters, intent.cursor, intent.limit).await
            } else {
                self.model.list(intent.cursor, intent.limit).await
            };
        }

        let items = self.collect(&intent).await?;
        Ok(paginate(items, intent.page, intent.limit))
    }

    pub async fn count(&self, params: &QueryParams) -> ModelResult<CountResult> {
        let intent = self.intent(params);

        if !intent.needs_full_scan() {
            let total = self.model.count(&intent.filters).await?;
            return Ok(CountResult { total });
        }

        let items = self.collect(&intent).await?;
        Ok(CountResult { total: items.len() })
    }

    /// Drain, search and sort everything the intent selects
    async fn collect(&self, intent: &QueryIntent) -> ModelResult<Vec<Record>> {
        let items = if intent.has_filters() {
            self.model.match_all(&intent.filters).await?
        } else {
            self.model.list_all().await?
        };

        let mut items = filter_by_search(items, intent.search.as_deref());
        if let Some(field) = &intent.sort_field {
            sort_records(&mut items, field, intent.sort_dir);
        }
        Ok(items)
    }
}

/// Keep records where any field's text contains `term`, case-insensitively
pub fn filter_by_search(items: Vec<Record>, term: Option<&str>) -> Vec<Record> {
    let Some(term) = term.filter(|t| !t.is_empty()) else {
        return items;
    };
    let term = term.to_lowercase();
    items
        .into_iter()
        .filter(|record| record.values().any(|v| search_text(v).to_lowercase().contains(&term)))
        .collect()
}

fn search_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Stable sort by `field`; missing or null values first ascending, last descending
pub fn sort_records(items: &mut [Record], field: &str, dir: SortDir) {
    items.sort_by(|a, b| {
        let ord = compare_values(a.get(field), b.get(field));
        match dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => search_text(x).cmp(&search_text(y)),
    }
}

/// Slice page `page` (1-based) of `limit` items; cursor is the next page number
pub fn paginate(items: Vec<Record>, page: usize, limit: usize) -> Page {
    let start = (page.max(1) - 1).saturating_mul(limit);
    let end = start.saturating_add(limit);
    let cursor = (end < items.len()).then(|| (page.max(1) + 1).to_string());
    let data = items.into_iter().skip(start).take(limit).collect();
    Page { data, cursor }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListIndex;
    use crate::schema::record;
    use crate::testing::{item_model, seeded_items};
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn names(page: &[Record]) -> Vec<&str> {
        page.iter().map(|r| r.get("name").and_then(Value::as_str).unwrap_or("-")).collect()
    }

    async fn service(names: &[&str], cap: usize) -> QueryService {
        let (model, adapter) = item_model(cap);
        adapter.seed(seeded_items(names)).await;
        QueryService::new(Arc::new(model), 10)
    }

    #[tokio::test]
    async fn test_sorted_desc_page_with_next_page_cursor() {
        let qs = service(&["ba", "aa", "ca", "ca"], 50).await;
        let page = qs
            .list(&params(&[("sortField", "name"), ("sortDir", "desc"), ("page", "1"), ("limit", "2")]))
            .await
            .unwrap();
        assert_eq!(names(&page.data), vec!["ca", "ca"]);
        let ids: Vec<_> = page.data.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!("2"), json!("3")]);
        assert_eq!(page.cursor.as_deref(), Some("2"));

        let last = qs
            .list(&params(&[("sortField", "name"), ("sortDir", "desc"), ("page", "2"), ("limit", "2")]))
            .await
            .unwrap();
        assert_eq!(names(&last.data), vec!["ba", "aa"]);
        assert!(last.cursor.is_none());
    }

    #[tokio::test]
    async fn test_sort_ascending_without_cursor() {
        let qs = service(&["ba", "aa", "ca", "ca"], 50).await;
        let page = qs.list(&params(&[("sortField", "name")])).await.unwrap();
        assert_eq!(names(&page.data), vec!["aa", "ba", "ca", "ca"]);
        assert!(page.cursor.is_none());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let qs = service(&["ba", "aa", "ca", "ca"], 50).await;
        assert_eq!(qs.list(&params(&[("q", "A")])).await.unwrap().data.len(), 4);
        assert!(qs.list(&params(&[("q", "z")])).await.unwrap().data.is_empty());
        assert_eq!(qs.count(&params(&[("search", "c")])).await.unwrap(), CountResult { total: 2 });
    }

    #[test]
    fn test_missing_values_sort_first_then_last() {
        let mut items = vec![
            record([("name", json!("b"))]),
            record([("other", json!(1))]),
            record([("name", json!("a"))]),
        ];
        sort_records(&mut items, "name", SortDir::Asc);
        assert_eq!(names(&items), vec!["-", "a", "b"]);

        sort_records(&mut items, "name", SortDir::Desc);
        assert_eq!(names(&items), vec!["b", "a", "-"]);
    }

    #[test]
    fn test_numeric_sort_and_stability() {
        let mut items = vec![
            record([("n", json!(10)), ("tag", json!("x"))]),
            record([("n", json!(9))]),
            record([("n", json!(10)), ("tag", json!("y"))]),
        ];
        sort_records(&mut items, "n", SortDir::Asc);
        assert_eq!(items[0]["n"], json!(9));
        assert_eq!(items[1]["tag"], json!("x"));
        assert_eq!(items[2]["tag"], json!("y"));
    }

    #[tokio::test]
    async fn test_plain_list_uses_model_cursor() {
        let qs = service(&["a", "b", "c", "d", "e"], 2).await;
        let page = qs.list(&params(&[("limit", "3")])).await.unwrap();
        assert_eq!(page.data.len(), 3);
        assert_eq!(page.cursor.as_deref(), Some("3"));

        let rest = qs.list(&params(&[("limit", "3"), ("cursor", "3")])).await.unwrap();
        assert_eq!(names(&rest.data), vec!["d", "e"]);
        assert!(rest.cursor.is_none());
    }

    #[tokio::test]
    async fn test_zero_limit_uses_page_size() {
        let names_list: Vec<String> = (0..15).map(|i| format!("n{i}")).collect();
        let refs: Vec<&str> = names_list.iter().map(String::as_str).collect();
        let qs = service(&refs, 50).await;
        for raw in ["0", "-1", "nope"] {
            assert_eq!(qs.list(&params(&[("limit", raw)])).await.unwrap().data.len(), 10);
        }
    }

    #[tokio::test]
    async fn test_filters_match_and_count() {
        let qs = service(&["a", "b", "a"], 50).await;
        let page = qs.list(&params(&[("name", "a")])).await.unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(qs.count(&params(&[("name", "a")])).await.unwrap().total, 2);
        assert_eq!(qs.count(&params(&[("name", "a"), ("sortField", "id")])).await.unwrap().total, 2);
        assert_eq!(qs.count(&QueryParams::new()).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn test_filters_are_coerced_to_field_types() {
        let (model, adapter) = item_model(50);
        adapter
            .seed([
                record([("id", json!("1")), ("qty", json!(2))]),
                record([("id", json!("2")), ("qty", json!(5))]),
            ])
            .await;
        let qs = QueryService::new(Arc::new(model), 10);
        let page = qs.list(&params(&[("qty", "5")])).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0]["id"], json!("2"));
    }

    #[tokio::test]
    async fn test_list_index_used_only_for_plain_listing() {
        use crate::model::Model;
        use crate::storage::{IndexDef, MemoryAdapter};
        let key = crate::testing::item_key();
        let adapter = Arc::new(MemoryAdapter::new(Model::entity_def(
            "item",
            &key,
            vec![IndexDef::new("named", &["name"])],
        )));
        adapter
            .seed([
                record([("id", json!("1")), ("name", json!("x"))]),
                record([("id", json!("2"))]),
            ])
            .await;
        let model = Model::new("item", crate::testing::item_schema(), key, adapter)
            .unwrap()
            .with_list_index(ListIndex::new("named"));
        let qs = QueryService::new(Arc::new(model), 10);

        assert_eq!(qs.list(&QueryParams::new()).await.unwrap().data.len(), 1);
        assert_eq!(qs.list(&params(&[("sortField", "id")])).await.unwrap().data.len(), 2);
    }

    #[test]
    fn test_paginate_boundary() {
        let items: Vec<Record> = (0..4).map(|i| record([("i", json!(i))])).collect();
        let page = paginate(items.clone(), 2, 2);
        assert_eq!(page.data.len(), 2);
        assert!(page.cursor.is_none());
        assert!(paginate(items, 3, 2).data.is_empty());
    }
}
