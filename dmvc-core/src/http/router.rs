//! Route table and in-process request dispatch
//!
//! Patterns are `/`-separated; a `:name` segment captures that path segment
//! into [`PathParams`]. Routes are tried in registration order and the first
//! match wins, so literal segments such as `/_count` must be registered
//! before a `/:id` sibling.

use super::utils::decode_path_segment;
use super::{ApiRequest, ApiResponse};
use crate::auth::AuthGuard;
use futures::future::BoxFuture;
use http::Method;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Path parameters extracted from dynamic routes
pub type PathParams = HashMap<String, String>;

/// Async route handler
pub type Handler = Arc<dyn Fn(ApiRequest) -> BoxFuture<'static, ApiResponse> + Send + Sync>;

/// Wrap an async closure as a [`Handler`]
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResponse> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Anything controllers can register guarded routes on
pub trait RouteTable {
    fn route(&mut self, method: Method, pattern: &str, guard: AuthGuard, handler: Handler);

    fn get(&mut self, pattern: &str, guard: AuthGuard, handler: Handler) {
        self.route(Method::GET, pattern, guard, handler);
    }

    fn post(&mut self, pattern: &str, guard: AuthGuard, handler: Handler) {
        self.route(Method::POST, pattern, guard, handler);
    }

    fn patch(&mut self, pattern: &str, guard: AuthGuard, handler: Handler) {
        self.route(Method::PATCH, pattern, guard, handler);
    }

    fn delete(&mut self, pattern: &str, guard: AuthGuard, handler: Handler) {
        self.route(Method::DELETE, pattern, guard, handler);
    }
}

struct Route {
    method: Method,
    pattern: String,
    guard: AuthGuard,
    handler: Handler,
}

impl Route {
    /// Extract path parameters from a URL path
    fn extract_params(&self, path: &str) -> Option<PathParams> {
        let pattern_parts: Vec<&str> = self.pattern.split('/').collect();
        let path_parts: Vec<&str> = path.split('/').collect();

        if pattern_parts.len() != path_parts.len() {
            return None;
        }

        let mut params = HashMap::new();

        for (pattern_part, path_part) in pattern_parts.iter().zip(path_parts.iter()) {
            if let Some(param_name) = pattern_part.strip_prefix(':') {
                if path_part.is_empty() {
                    return None;
                }
                params.insert(param_name.to_string(), decode_path_segment(path_part));
            } else if pattern_part != path_part {
                return None;
            }
        }

        Some(params)
    }
}

/// Ordered list of guarded routes
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// `METHOD pattern` for every route, in match order
    pub fn describe(&self) -> Vec<String> {
        self.routes.iter().map(|r| format!("{} {}", r.method, r.pattern)).collect()
    }

    /// Dispatch a request: match, authorize, run the handler
    pub async fn handle(&self, mut req: ApiRequest) -> ApiResponse {
        let path = normalize(&req.path).to_string();
        let mut allowed = Vec::new();

        for route in &self.routes {
            let Some(params) = route.extract_params(&path) else {
                continue;
            };
            if route.method != req.method {
                if !allowed.contains(&route.method) {
                    allowed.push(route.method.clone());
                }
                continue;
            }

            if let Err(err) = route.guard.authorize(req.actor.as_ref()).await {
                log::debug!("{} {} denied: {}", req.method, path, err);
                return ApiResponse::auth_error(err);
            }

            req.params = params;
            return (route.handler)(req).await;
        }

        if allowed.is_empty() {
            ApiResponse::not_found("Route")
        } else {
            ApiResponse::method_not_allowed(&allowed)
        }
    }
}

impl RouteTable for Router {
    fn route(&mut self, method: Method, pattern: &str, guard: AuthGuard, handler: Handler) {
        log::debug!("Route registered: {} {}", method, pattern);
        self.routes.push(Route { method, pattern: normalize(pattern).to_string(), guard, handler });
    }
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}
