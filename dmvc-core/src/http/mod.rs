//! Framework-agnostic HTTP surface
//!
//! Controllers only see [`ApiRequest`] and produce [`ApiResponse`]; they bind
//! routes through the [`RouteTable`] abstraction. [`Router`] is the in-process
//! route table and [`HttpServer`] serves it over hyper.

pub mod router;
pub mod server;
pub mod utils;

pub use router::{handler, Handler, PathParams, RouteTable, Router};
pub use server::HttpServer;
pub use utils::{body_from, json_error_response, parse_query, Req, Resp, RespBody};

use crate::auth::{Actor, AuthError};
use crate::error::ModelError;
use crate::query::QueryParams;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};

/// Incoming request as seen by route handlers
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: QueryParams,
    /// Filled in by the router from `:name` pattern segments
    pub params: PathParams,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub actor: Option<Actor>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            params: PathParams::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            actor: None,
        }
    }

    /// Build from a path that may carry a query string (`/items?limit=2`)
    pub fn from_uri(method: Method, uri: &str) -> Self {
        match uri.split_once('?') {
            Some((path, query)) => Self::new(method, path).with_query(parse_query(query)),
            None => Self::new(method, uri),
        }
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_json(self, body: &Value) -> Self {
        self.with_body(body.to_string())
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Parse the body as JSON; an empty body is `Ok(None)`
    pub fn json_body(&self) -> Result<Option<Value>, serde_json::Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&self.body).map(Some)
    }
}

/// Response produced by route handlers
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn json<T: Serialize>(status: StatusCode, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(body) => Self { status, headers: HeaderMap::new(), body: Some(body) },
            Err(e) => {
                log::error!("Failed to serialize response: {}", e);
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", &e.to_string())
            }
        }
    }

    pub fn ok<T: Serialize>(data: &T) -> Self {
        Self::json(StatusCode::OK, data)
    }

    pub fn empty(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), body: None }
    }

    /// Uniform error body: `{"error": code, "message": detail}`
    pub fn error(status: StatusCode, error: &str, message: &str) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Some(json!({ "error": error, "message": message })),
        }
    }

    pub fn not_found(resource: &str) -> Self {
        Self::error(StatusCode::NOT_FOUND, "not_found", &format!("{} not found", resource))
    }

    pub fn method_not_allowed(allowed: &[Method]) -> Self {
        let mut resp = Self::error(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "Method not allowed");
        let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
        if let Ok(value) = HeaderValue::from_str(&allow) {
            resp.headers.insert(http::header::ALLOW, value);
        }
        resp
    }

    /// 401/403 bodies carry only the error name
    pub fn auth_error(err: AuthError) -> Self {
        Self { status: err.status(), headers: HeaderMap::new(), body: Some(json!({ "error": err.to_string() })) }
    }

    pub fn from_model_error(err: &ModelError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            log::error!("❌ {}", err);
        } else {
            log::debug!("Request rejected: {}", err);
        }
        let mut resp = Self::error(status, err.code(), &err.to_string());
        if let (ModelError::Validation(validation), Some(Value::Object(body))) = (err, resp.body.as_mut()) {
            body.insert("issues".into(), json!(validation.issues));
        }
        resp
    }

    /// Serialized body bytes (empty when there is no body)
    pub fn body_bytes(&self) -> Bytes {
        match &self.body {
            Some(body) => Bytes::from(body.to_string()),
            None => Bytes::new(),
        }
    }
}
