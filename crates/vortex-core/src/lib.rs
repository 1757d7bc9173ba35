//! Core library for the Vortex HR client.
//!
//! This crate holds everything the front ends share:
//! - `storage`: key-value backends the session is persisted into
//! - `auth`: session store, auth service and the process-wide auth context
//! - `api`: REST client and the response handling every call goes through
//! - `routing`: route table, route guard and layout shell checks
//! - `config`: application configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod routing;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, ApiRequest, Backend};
pub use auth::{AuthContext, AuthError, AuthService, AuthState, SessionStore};
pub use config::Config;
pub use models::{AuthUser, Role, RoleRequirement, Session};
pub use routing::{Decision, Redirect, View};
