use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend rejected the presented credential (HTTP 401).
    #[error("Unauthorized - token may be expired")]
    Unauthorized { message: Option<String> },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    /// Any other non-success status; carries the server's message.
    #[error("{0}")]
    Rejected(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ApiError::Unauthorized {
                message: Some(message),
            },
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::Rejected(message),
        }
    }

    /// True when the backend no longer accepts the session's credential.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}
