//! Resolving the authenticated actor from request headers

use super::Actor;
use crate::config::AuthConfig;
use async_trait::async_trait;
use http::HeaderMap;
use std::collections::HashMap;

/// Turns request headers into the calling [`Actor`], if any
#[async_trait]
pub trait ActorResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Option<Actor>;
}

#[async_trait]
impl<F> ActorResolver for F
where
    F: Fn(&HeaderMap) -> Option<Actor> + Send + Sync,
{
    async fn resolve(&self, headers: &HeaderMap) -> Option<Actor> {
        self(headers)
    }
}

/// Static token table: `Authorization: Bearer <token>` maps to a fixed actor
#[derive(Debug, Clone, Default)]
pub struct BearerTokenResolver {
    tokens: HashMap<String, Actor>,
}

impl BearerTokenResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|(token, attrs)| (token.clone(), Actor::new(attrs.clone())))
            .collect();
        Self { tokens }
    }

    pub fn with_token(mut self, token: impl Into<String>, actor: Actor) -> Self {
        self.tokens.insert(token.into(), actor);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl ActorResolver for BearerTokenResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Option<Actor> {
        let token = bearer_token(headers)?;
        let actor = self.tokens.get(token).cloned();
        if actor.is_none() {
            log::debug!("Rejected unknown bearer token");
        }
        actor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_bearer_token_lookup() {
        let resolver = BearerTokenResolver::new().with_token("t-admin", Actor::with_role("u1", "admin"));

        let actor = resolver.resolve(&headers("Bearer t-admin")).await.unwrap();
        assert_eq!(actor.role(), Some("admin"));
        assert!(resolver.resolve(&headers("Bearer other")).await.is_none());
        assert!(resolver.resolve(&headers("Basic t-admin")).await.is_none());
        assert!(resolver.resolve(&HeaderMap::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_from_config() {
        let mut config = AuthConfig::default();
        let attrs = json!({"id": "svc", "role": "service"}).as_object().cloned().unwrap();
        config.tokens.insert("secret".into(), attrs);

        let resolver = BearerTokenResolver::from_config(&config);
        assert_eq!(resolver.len(), 1);
        let actor = resolver.resolve(&headers("Bearer secret")).await.unwrap();
        assert_eq!(actor.created_by(), Some(json!("svc")));
    }

    #[tokio::test]
    async fn test_closure_resolver() {
        let resolver = |headers: &HeaderMap| {
            headers.get("x-user").and_then(|v| v.to_str().ok()).map(|id| Actor::with_role(id, "user"))
        };
        let mut map = HeaderMap::new();
        map.insert("x-user", HeaderValue::from_static("u9"));
        let actor = resolver.resolve(&map).await.unwrap();
        assert_eq!(actor.get("id"), Some(&json!("u9")));
    }
}
