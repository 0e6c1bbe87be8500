//! Base controller: the six CRUD routes over one model
//!
//! | Route                  | Operation      |
//! |------------------------|----------------|
//! | `GET {base}`           | list           |
//! | `GET {base}/_count`    | count          |
//! | `GET {base}/:id`       | get by id      |
//! | `POST {base}`          | create         |
//! | `PATCH {base}`         | update         |
//! | `DELETE {base}/:id`    | delete by id   |
//!
//! For composite keys the path parameter only carries the primary key
//! component; the rest is looked up before get/delete and backfilled before
//! update. Those lookups are read-then-write with no isolation.

pub mod options;

pub use options::{ControllerOptions, RoleOptions};

use crate::auth::Actor;
use crate::error::ModelResult;
use crate::http::{handler, ApiRequest, ApiResponse, RouteTable};
use crate::model::{KeyInput, Model};
use crate::query::{CountResult, QueryParams, QueryService};
use crate::schema::Record;
use crate::storage::Page;
use http::StatusCode;
use serde_json::Value;
use std::sync::Arc;

/// Status plus optional payload returned by controller operations
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerResult {
    pub status: StatusCode,
    pub data: Option<Value>,
}

impl ControllerResult {
    fn with(status: StatusCode, data: Value) -> Self {
        Self { status, data: Some(data) }
    }

    fn not_found() -> Self {
        Self { status: StatusCode::NOT_FOUND, data: None }
    }
}

pub struct Controller {
    model: Arc<Model>,
    options: ControllerOptions,
    pk_name: String,
    key_names: Vec<String>,
    query: QueryService,
}

impl Controller {
    pub fn new(model: Arc<Model>, options: ControllerOptions) -> Self {
        let key_names = model.key_names();
        let pk_name = options.id_param.clone().or_else(|| key_names.first().cloned()).unwrap_or_default();
        let query = QueryService::new(model.clone(), options.page_size);
        Self { model, options, pk_name, key_names, query }
    }

    /// Name of the `:param` used by get/delete routes
    pub fn pk_name(&self) -> &str {
        &self.pk_name
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    fn is_composite(&self) -> bool {
        self.key_names.len() > 1
    }

    /// `{field: id}` with the id coerced to the field's declared type
    fn id_facets(&self, field: &str, id: &str) -> Record {
        let mut facets = Record::new();
        facets.insert(field.to_string(), Value::String(id.to_string()));
        self.model.schema().coerce_facets(facets)
    }

    async fn first_match(&self, field: &str, id: &str) -> ModelResult<Option<Record>> {
        let page = self.model.find(&self.id_facets(field, id), None, 1).await?;
        Ok(page.data.into_iter().next())
    }

    pub async fn list(&self, query: &QueryParams) -> ModelResult<Page> {
        self.query.list(query).await
    }

    pub async fn count(&self, query: &QueryParams) -> ModelResult<CountResult> {
        self.query.count(query).await
    }

    pub async fn get_by_id(&self, id: &str) -> ModelResult<ControllerResult> {
        let item = if self.is_composite() {
            self.first_match(&self.pk_name, id).await?
        } else {
            self.model.get(KeyInput::Key(self.id_facets(&self.pk_name, id))).await?
        };
        Ok(match item {
            Some(record) => ControllerResult::with(StatusCode::OK, Value::Object(record)),
            None => ControllerResult::not_found(),
        })
    }

    /// Create from a request body; anything but a JSON object counts as `{}`
    pub async fn create(&self, body: Option<Value>, actor: Option<&Actor>) -> ModelResult<ControllerResult> {
        let mut payload = match body {
            Some(Value::Object(map)) => map,
            _ => Record::new(),
        };
        if let Some(created_by) = actor.and_then(Actor::created_by) {
            payload.insert("createdBy".to_string(), created_by);
        }
        let created = self.model.create(&Value::Object(payload)).await?;
        Ok(ControllerResult::with(StatusCode::CREATED, Value::Object(created)))
    }

    pub async fn update(&self, updates: Value) -> ModelResult<ControllerResult> {
        let mut changes = updates;
        if let (true, Value::Object(map)) = (self.is_composite(), &mut changes) {
            self.backfill_key(map).await?;
        }
        let updated = self.model.update(&changes).await?;
        Ok(ControllerResult::with(StatusCode::OK, Value::Object(updated)))
    }

    /// Fill missing composite key parts from the record sharing the primary key
    async fn backfill_key(&self, changes: &mut Record) -> ModelResult<()> {
        let missing: Vec<&String> = self.key_names.iter().filter(|k| !changes.contains_key(*k)).collect();
        let primary = &self.key_names[0];
        let pk_value = match changes.get(primary) {
            Some(Value::String(value)) if !missing.is_empty() => value.clone(),
            _ => return Ok(()),
        };

        if let Some(existing) = self.first_match(primary, &pk_value).await? {
            for key in missing {
                if let Some(value) = existing.get(key) {
                    changes.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    pub async fn delete_by_id(&self, id: &str) -> ModelResult<ControllerResult> {
        let key = if self.is_composite() {
            let Some(existing) = self.first_match(&self.pk_name, id).await? else {
                return Ok(ControllerResult::not_found());
            };
            let key: Record = self
                .key_names
                .iter()
                .map(|k| (k.clone(), existing.get(k).cloned().unwrap_or(Value::Null)))
                .collect();
            KeyInput::Key(key)
        } else {
            KeyInput::Key(self.id_facets(&self.pk_name, id))
        };

        let deleted = self.model.delete(key).await?;
        if deleted.data.is_empty() {
            return Ok(ControllerResult::not_found());
        }
        Ok(ControllerResult::with(StatusCode::OK, deleted.into()))
    }

    /// Bind the six routes for `model` on `table` and return the controller
    pub fn register(table: &mut impl RouteTable, model: Arc<Model>, options: ControllerOptions) -> Arc<Controller> {
        let controller = Arc::new(Controller::new(model, options));
        let opts = &controller.options;
        let base = opts.base().to_string();
        let item_path = format!("{}/:{}", base, controller.pk_name);
        let root = if base.is_empty() { "/".to_string() } else { base.clone() };

        let c = controller.clone();
        table.get(
            &root,
            opts.guard(&opts.roles.list),
            handler(move |req: ApiRequest| {
                let c = c.clone();
                async move { respond(c.list(&req.query).await.map(|page| ApiResponse::ok(&page))) }
            }),
        );

        let c = controller.clone();
        table.get(
            &format!("{}/_count", base),
            opts.guard(&opts.roles.list),
            handler(move |req: ApiRequest| {
                let c = c.clone();
                async move { respond(c.count(&req.query).await.map(|count| ApiResponse::ok(&count))) }
            }),
        );

        let c = controller.clone();
        table.get(
            &item_path,
            opts.guard(&opts.roles.get),
            handler(move |req: ApiRequest| {
                let c = c.clone();
                async move {
                    let id = req.param(&c.pk_name).unwrap_or_default().to_string();
                    respond(c.get_by_id(&id).await.map(|r| c.to_response(r)))
                }
            }),
        );

        let c = controller.clone();
        table.post(
            &root,
            opts.guard(&opts.roles.create),
            handler(move |req: ApiRequest| {
                let c = c.clone();
                async move {
                    // Malformed JSON is treated as an empty body
                    let body = req.json_body().ok().flatten();
                    respond(c.create(body, req.actor.as_ref()).await.map(|r| c.to_response(r)))
                }
            }),
        );

        let c = controller.clone();
        table.patch(
            &root,
            opts.guard(&opts.roles.update),
            handler(move |req: ApiRequest| {
                let c = c.clone();
                async move {
                    let updates = match req.json_body() {
                        Ok(body) => body.unwrap_or_else(|| Value::Object(Record::new())),
                        Err(e) => {
                            return ApiResponse::error(StatusCode::BAD_REQUEST, "invalid_json", &e.to_string())
                        }
                    };
                    respond(c.update(updates).await.map(|r| c.to_response(r)))
                }
            }),
        );

        let c = controller.clone();
        table.delete(
            &item_path,
            opts.guard(&opts.roles.delete),
            handler(move |req: ApiRequest| {
                let c = c.clone();
                async move {
                    let id = req.param(&c.pk_name).unwrap_or_default().to_string();
                    respond(c.delete_by_id(&id).await.map(|r| c.to_response(r)))
                }
            }),
        );

        log::info!("🔗 {} routes mounted at {}", controller.model.name(), root);
        controller
    }

    fn to_response(&self, result: ControllerResult) -> ApiResponse {
        match result.data {
            _ if result.status == StatusCode::NOT_FOUND => ApiResponse::not_found(self.model.name()),
            Some(data) => ApiResponse::json(result.status, &data),
            None => ApiResponse::empty(result.status),
        }
    }
}

fn respond(result: ModelResult<ApiResponse>) -> ApiResponse {
    result.unwrap_or_else(|err| ApiResponse::from_model_error(&err))
}
