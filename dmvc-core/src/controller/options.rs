//! Controller configuration

use crate::auth::{AuthCheck, AuthGuard};
use crate::model::DEFAULT_LIMIT;
use std::sync::Arc;

/// Allowed roles per controller operation; empty means "any authenticated actor"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleOptions {
    pub list: Vec<String>,
    pub get: Vec<String>,
    pub create: Vec<String>,
    pub update: Vec<String>,
    pub delete: Vec<String>,
}

impl RoleOptions {
    /// The same roles for every operation
    pub fn all<S: Into<String> + Clone>(roles: &[S]) -> Self {
        let roles: Vec<String> = roles.iter().cloned().map(Into::into).collect();
        Self {
            list: roles.clone(),
            get: roles.clone(),
            create: roles.clone(),
            update: roles.clone(),
            delete: roles,
        }
    }
}

#[derive(Clone)]
pub struct ControllerOptions {
    /// Route prefix, e.g. `/items`
    pub base_path: String,
    /// Path parameter naming the primary key; defaults to the first key field
    pub id_param: Option<String>,
    pub roles: RoleOptions,
    pub auth_check: Option<Arc<dyn AuthCheck>>,
    pub page_size: usize,
    pub skip_auth: bool,
}

impl ControllerOptions {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            id_param: None,
            roles: RoleOptions::default(),
            auth_check: None,
            page_size: DEFAULT_LIMIT,
            skip_auth: false,
        }
    }

    pub fn with_id_param(mut self, id_param: impl Into<String>) -> Self {
        self.id_param = Some(id_param.into());
        self
    }

    pub fn with_roles(mut self, roles: RoleOptions) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_auth_check(mut self, check: Arc<dyn AuthCheck>) -> Self {
        self.auth_check = Some(check);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn skip_auth(mut self, skip: bool) -> Self {
        self.skip_auth = skip;
        self
    }

    pub(crate) fn guard(&self, roles: &[String]) -> AuthGuard {
        let guard = AuthGuard::new(roles.iter().cloned()).skip_auth(self.skip_auth);
        match &self.auth_check {
            Some(check) => guard.with_check(check.clone()),
            None => guard,
        }
    }

    /// Base path without a trailing slash
    pub(crate) fn base(&self) -> &str {
        self.base_path.trim_end_matches('/')
    }
}

impl std::fmt::Debug for ControllerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerOptions")
            .field("base_path", &self.base_path)
            .field("id_param", &self.id_param)
            .field("roles", &self.roles)
            .field("auth_check", &self.auth_check.is_some())
            .field("page_size", &self.page_size)
            .field("skip_auth", &self.skip_auth)
            .finish()
    }
}
