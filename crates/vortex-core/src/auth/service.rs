//! Network side of authentication: login, logout, sign-up and invitation
//! password setup.

use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiRequest, Backend};
use crate::models::{Role, Session};
use crate::storage::KeyValueStore;

use super::error::SERVER_ERROR;
use super::password::validate_new_password;
use super::{AuthError, SessionStore};

const LOGIN_PATH: &str = "login/";
const LOGOUT_PATH: &str = "logout/";
const SIGNUP_PATH: &str = "signup/";
const VALIDATE_TOKEN_PATH: &str = "validate-token/";
const SET_PASSWORD_PATH: &str = "set-password/";

/// Name shown on the password setup view when the invitation has none
const DEFAULT_INVITEE_NAME: &str = "Employee";

/// Login payload as the backend sends it.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Normalized result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub role: Role,
    pub employee_id: Option<String>,
    pub name: String,
}

impl LoginResponse {
    /// Fill in everything the backend may leave out.
    ///
    /// - role: missing or empty means `admin` (backends predating roles)
    /// - employee id: missing or empty means none
    /// - name: missing or empty falls back to the submitted username
    pub fn normalize(self, username: &str) -> Result<LoginGrant, AuthError> {
        if self.access.is_empty() {
            warn!("Login response carried an empty access token");
            return Err(AuthError::Server(SERVER_ERROR.to_string()));
        }

        let role = Role::or_default(self.role.as_deref());
        let employee_id = self.employee_id.filter(|id| !id.is_empty());
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| username.to_string());
        let refresh_token = self.refresh.filter(|r| !r.is_empty());

        Ok(LoginGrant {
            access_token: self.access,
            refresh_token,
            role,
            employee_id,
            name,
        })
    }
}

impl LoginGrant {
    pub fn into_session(self, username: &str) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            username: username.to_string(),
            name: self.name,
            role: self.role,
            employee_id: self.employee_id,
        }
    }
}

// Employee ids arrive as strings or numbers depending on the backend version.
fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Wraps the auth endpoints of a `Backend`.
///
/// Nothing here touches the session store; the auth context writes and
/// clears it so store and in-memory state move together.
pub struct AuthService<B> {
    backend: B,
}

impl<B: Backend> AuthService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Exchange credentials for a normalized login grant.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, AuthError> {
        let request = ApiRequest::post(
            LOGIN_PATH,
            json!({ "username": username, "password": password }),
        );

        let value = self
            .backend
            .send(&request, None)
            .await
            .map_err(AuthError::from_api)?;

        let response: LoginResponse = serde_json::from_value(value).map_err(|e| {
            warn!(error = %e, "Unexpected login response shape");
            AuthError::Server(SERVER_ERROR.to_string())
        })?;

        let grant = response.normalize(username)?;
        info!(username, role = %grant.role, "Login accepted");
        Ok(grant)
    }

    /// Ask the backend to invalidate the refresh token.
    ///
    /// The outcome is informational only; callers tear the session down
    /// whatever happens here.
    pub async fn logout(&self, session: &Session) -> Result<(), ApiError> {
        let request = ApiRequest::post(
            LOGOUT_PATH,
            json!({ "refresh": session.refresh_token }),
        );
        self.backend
            .send(&request, Some(&session.access_token))
            .await?;
        debug!("Server-side logout acknowledged");
        Ok(())
    }

    /// Whether a session is stored. No network call.
    pub fn is_authenticated<S: KeyValueStore>(store: &SessionStore<S>) -> bool {
        store.has_session()
    }

    /// Create an account. Returns the backend's payload.
    pub async fn signup(&self, username: &str, password: &str) -> Result<Value, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let request = ApiRequest::post(
            SIGNUP_PATH,
            json!({ "username": username, "password": password }),
        );
        let value = self
            .backend
            .send(&request, None)
            .await
            .map_err(AuthError::from_api)?;
        info!(username, "Account created");
        Ok(value)
    }

    /// Check an invitation token and return the invitee's display name.
    pub async fn validate_invite(&self, token: &str) -> Result<String, AuthError> {
        let request = ApiRequest::post(VALIDATE_TOKEN_PATH, json!({ "token": token }));
        let value = self
            .backend
            .send(&request, None)
            .await
            .map_err(AuthError::from_api)?;

        Ok(value
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_INVITEE_NAME)
            .to_string())
    }

    /// Set the password for an invitation after checking the local policy.
    pub async fn set_password(
        &self,
        token: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(password, confirmation)?;

        let request = ApiRequest::post(
            SET_PASSWORD_PATH,
            json!({ "token": token, "password": password }),
        );
        self.backend
            .send(&request, None)
            .await
            .map_err(AuthError::from_api)?;
        info!("Invitation password set");
        Ok(())
    }
}
