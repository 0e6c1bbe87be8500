//! Role-based auth guard
//!
//! An [`AuthGuard`] decides whether an [`Actor`] may call one controller
//! operation. Evaluation order:
//!
//! 1. the skip flag bypasses everything
//! 2. an allow-list containing [`ANONYMOUS_ROLE`] admits anyone, even without an actor
//! 3. no actor fails with [`AuthError::Unauthorized`]
//! 4. a non-empty allow-list admits the actor if the custom check passes, or
//!    (without a check) if the actor's role is listed; otherwise
//!    [`AuthError::Forbidden`]
//! 5. an empty allow-list admits any authenticated actor

pub mod resolver;

pub use resolver::{ActorResolver, BearerTokenResolver};

use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Role sentinel that disables the authentication requirement
pub const ANONYMOUS_ROLE: &str = "anonymous";

/// The authenticated caller: a role plus arbitrary attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(Map<String, Value>);

impl Actor {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    /// Actor with only an `id` and a `role`
    pub fn with_role(id: impl Into<String>, role: impl Into<String>) -> Self {
        let mut attrs = Map::new();
        attrs.insert("id".into(), Value::String(id.into()));
        attrs.insert("role".into(), Value::String(role.into()));
        Self(attrs)
    }

    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Identity stamped on created records: first of `id`, `user`, `sub`
    /// that is present, and only if that value is truthy
    pub fn created_by(&self) -> Option<Value> {
        let value = ["id", "user", "sub"].iter().find_map(|k| self.0.get(*k).filter(|v| !v.is_null()))?;
        is_truthy(value).then(|| value.clone())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Authorization failures
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

/// Custom authorization predicate, consulted instead of role membership
#[async_trait]
pub trait AuthCheck: Send + Sync {
    async fn check(&self, actor: &Actor, allowed_roles: &[String]) -> bool;
}

#[async_trait]
impl<F> AuthCheck for F
where
    F: Fn(&Actor, &[String]) -> bool + Send + Sync,
{
    async fn check(&self, actor: &Actor, allowed_roles: &[String]) -> bool {
        self(actor, allowed_roles)
    }
}

/// Guard for one operation
#[derive(Clone, Default)]
pub struct AuthGuard {
    allowed_roles: Vec<String>,
    check: Option<Arc<dyn AuthCheck>>,
    skip_auth: bool,
}

impl AuthGuard {
    pub fn new<S: Into<String>>(allowed_roles: impl IntoIterator<Item = S>) -> Self {
        Self { allowed_roles: allowed_roles.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    pub fn with_check(mut self, check: Arc<dyn AuthCheck>) -> Self {
        self.check = Some(check);
        self
    }

    pub fn skip_auth(mut self, skip: bool) -> Self {
        self.skip_auth = skip;
        self
    }

    pub fn allowed_roles(&self) -> &[String] {
        &self.allowed_roles
    }

    pub async fn authorize(&self, actor: Option<&Actor>) -> Result<(), AuthError> {
        if self.skip_auth || self.allowed_roles.iter().any(|r| r == ANONYMOUS_ROLE) {
            return Ok(());
        }
        let actor = actor.ok_or(AuthError::Unauthorized)?;
        if self.allowed_roles.is_empty() {
            return Ok(());
        }
        let permitted = match &self.check {
            Some(check) => check.check(actor, &self.allowed_roles).await,
            None => actor.role().is_some_and(|role| self.allowed_roles.iter().any(|r| r == role)),
        };
        if permitted {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

impl std::fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGuard")
            .field("allowed_roles", &self.allowed_roles)
            .field("custom_check", &self.check.is_some())
            .field("skip_auth", &self.skip_auth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn actor(value: Value) -> Actor {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_role_membership() {
        let guard = AuthGuard::new(["admin"]);
        assert_eq!(guard.authorize(Some(&Actor::with_role("u1", "guest"))).await, Err(AuthError::Forbidden));
        assert_eq!(guard.authorize(Some(&Actor::with_role("u1", "admin"))).await, Ok(()));
        assert_eq!(guard.authorize(None).await, Err(AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_anonymous_admits_everyone() {
        let guard = AuthGuard::new(["anonymous"]);
        assert!(guard.authorize(None).await.is_ok());
        assert!(guard.authorize(Some(&Actor::with_role("u", "guest"))).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_roles_require_any_actor() {
        let guard = AuthGuard::new(Vec::<String>::new());
        assert_eq!(guard.authorize(None).await, Err(AuthError::Unauthorized));
        assert!(guard.authorize(Some(&actor(json!({"id": "u"})))).await.is_ok());
    }

    #[tokio::test]
    async fn test_skip_flag_bypasses_everything() {
        let guard = AuthGuard::new(["admin"]).skip_auth(true);
        assert!(guard.authorize(None).await.is_ok());
    }

    #[tokio::test]
    async fn test_custom_check_replaces_role_membership() {
        let check = |actor: &Actor, _roles: &[String]| actor.get("tier") == Some(&json!("gold"));
        let guard = AuthGuard::new(["admin"]).with_check(Arc::new(check));

        assert!(guard.authorize(Some(&actor(json!({"role": "guest", "tier": "gold"})))).await.is_ok());
        assert_eq!(
            guard.authorize(Some(&actor(json!({"role": "admin"})))).await,
            Err(AuthError::Forbidden)
        );
    }

    #[test]
    fn test_created_by_priority_and_truthiness() {
        assert_eq!(actor(json!({"id": "u1", "sub": "s"})).created_by(), Some(json!("u1")));
        assert_eq!(actor(json!({"user": "bob", "sub": "s"})).created_by(), Some(json!("bob")));
        assert_eq!(actor(json!({"sub": "s"})).created_by(), Some(json!("s")));
        assert_eq!(actor(json!({"id": "", "user": "bob"})).created_by(), None);
        assert_eq!(actor(json!({"role": "admin"})).created_by(), None);
    }
}
