use tracing::{debug, warn};

use crate::models::{Role, Session};
use crate::storage::{KeyValueStore, StorageError};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USERNAME_KEY: &str = "username";
pub const NAME_KEY: &str = "user_name";
pub const ROLE_KEY: &str = "user_role";
pub const EMPLOYEE_ID_KEY: &str = "employee_id";

/// Every key a session occupies. Teardown removes all of them together.
pub const SESSION_KEYS: [&str; 6] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    USERNAME_KEY,
    NAME_KEY,
    ROLE_KEY,
    EMPLOYEE_ID_KEY,
];

/// Placeholder for identity fields missing from an otherwise valid session
const UNKNOWN_USER: &str = "User";

/// Sole owner of the persisted session.
///
/// Each field is stored under its own key. The store does not look inside
/// tokens; whether a token is still accepted is only known from the
/// backend's responses.
pub struct SessionStore<S> {
    backend: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Persist every field of `session`.
    ///
    /// The write is all or nothing: if any field fails, whatever was
    /// written is cleared again and the error is returned, so a later
    /// `read` sees no session.
    pub fn write(&mut self, session: &Session) -> Result<(), StorageError> {
        if let Err(e) = self.write_fields(session) {
            warn!(error = %e, "Failed to persist session, rolling back");
            self.clear();
            return Err(e);
        }
        debug!(username = %session.username, role = %session.role, "Session persisted");
        Ok(())
    }

    fn write_fields(&mut self, session: &Session) -> Result<(), StorageError> {
        self.backend.set(ACCESS_TOKEN_KEY, &session.access_token)?;
        self.set_optional(REFRESH_TOKEN_KEY, session.refresh_token.as_deref())?;
        self.backend.set(USERNAME_KEY, &session.username)?;
        self.backend.set(NAME_KEY, &session.name)?;
        self.backend.set(ROLE_KEY, session.role.as_str())?;
        self.set_optional(EMPLOYEE_ID_KEY, session.employee_id.as_deref())?;
        Ok(())
    }

    // Absent optional fields are removed so nothing from an earlier session
    // survives into this one.
    fn set_optional(&mut self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        match value {
            Some(v) => self.backend.set(key, v),
            None => self.backend.remove(key),
        }
    }

    /// Reconstruct the stored session.
    ///
    /// Returns `None` when there is no non-empty access token. Storage
    /// errors are logged and also read as `None`.
    pub fn read(&self) -> Option<Session> {
        match self.read_fields() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session, treating as signed out");
                None
            }
        }
    }

    fn read_fields(&self) -> Result<Option<Session>, StorageError> {
        let access_token = match self.backend.get(ACCESS_TOKEN_KEY)? {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(None),
        };

        let refresh_token = self.get_non_empty(REFRESH_TOKEN_KEY)?;
        let username = self
            .get_non_empty(USERNAME_KEY)?
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        let name = self
            .get_non_empty(NAME_KEY)?
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        let role = Role::or_default(self.get_non_empty(ROLE_KEY)?.as_deref());
        let employee_id = self.get_non_empty(EMPLOYEE_ID_KEY)?;

        Ok(Some(Session {
            access_token,
            refresh_token,
            username,
            name,
            role,
            employee_id,
        }))
    }

    fn get_non_empty(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.backend.get(key)?.filter(|v| !v.is_empty()))
    }

    /// Remove every session key. Safe to call when nothing is stored.
    pub fn clear(&mut self) {
        for key in SESSION_KEYS {
            if let Err(e) = self.backend.remove(key) {
                warn!(key, error = %e, "Failed to remove session key");
            }
        }
        debug!("Session cleared");
    }

    /// Whether a session with an access token is stored.
    pub fn has_session(&self) -> bool {
        self.read().is_some()
    }
}
