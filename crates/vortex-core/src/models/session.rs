use chrono::{DateTime, Utc};

use super::Role;

/// Message shown on the login view after the backend rejected the session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";

/// The persisted authentication record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub employee_id: Option<String>,
}

impl Session {
    /// The identity part of the session, without credentials.
    pub fn user(&self) -> AuthUser {
        AuthUser {
            username: self.username.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
            employee_id: self.employee_id.clone(),
        }
    }
}

/// Current user as exposed to views and the route guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub name: String,
    pub role: Role,
    pub employee_id: Option<String>,
}

/// One-shot notice for the login view, set when a session is torn down
/// because the backend rejected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionNotice {
    pub message: String,
    pub at: DateTime<Utc>,
}

impl SessionNotice {
    pub fn expired() -> Self {
        Self {
            message: SESSION_EXPIRED_MESSAGE.to_string(),
            at: Utc::now(),
        }
    }
}
