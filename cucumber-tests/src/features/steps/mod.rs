pub mod auth_steps;
pub mod crud_steps;
pub mod query_steps;
