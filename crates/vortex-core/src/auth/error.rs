use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

use super::password::PasswordError;

/// Message for a rejected login when the server gave none
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Message for transport failures, rate limiting and unparseable responses
pub const SERVER_ERROR: &str = "Server error. Please try again later.";

/// Failures surfaced to the login and password views.
///
/// `Display` is the message the view shows verbatim.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username and password required")]
    MissingCredentials,

    /// The backend refused the request; carries its message.
    #[error("{0}")]
    Credentials(String),

    /// Backend failure. Carries the server's own message when its error
    /// payload was readable, `SERVER_ERROR` otherwise.
    #[error("{0}")]
    Server(String),

    #[error("Could not save session: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AuthError {
    /// Classify an API failure from an unauthenticated auth endpoint.
    ///
    /// A 401 here means the submitted credentials were wrong, not that a
    /// session expired.
    pub fn from_api(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { message } => {
                AuthError::Credentials(non_empty_or(message.unwrap_or_default(), INVALID_CREDENTIALS))
            }
            ApiError::AccessDenied(message) | ApiError::Rejected(message) => {
                AuthError::Credentials(message)
            }
            // Only built from a parsed JSON payload, so the message is the server's
            ApiError::NotFound(message) | ApiError::ServerError(message) => {
                AuthError::Server(non_empty_or(message, SERVER_ERROR))
            }
            ApiError::RateLimited | ApiError::NetworkError(_) | ApiError::InvalidResponse(_) => {
                AuthError::Server(SERVER_ERROR.to_string())
            }
        }
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
