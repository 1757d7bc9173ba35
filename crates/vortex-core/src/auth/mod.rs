//! Authentication module for managing user sessions.
//!
//! This module provides:
//! - `SessionStore`: persistence of the session, one key per field
//! - `AuthService`: login/logout round trips and login result normalization
//! - `AuthContext`: the in-memory auth state every view and guard reads
//!
//! Sessions live until logout or until the backend rejects the token.

pub mod context;
pub mod error;
pub mod password;
pub mod service;
pub mod session;

pub use context::{AuthContext, AuthState};
pub use error::AuthError;
pub use password::{validate_new_password, PasswordError};
pub use service::{AuthService, LoginGrant, LoginResponse};
pub use session::SessionStore;
