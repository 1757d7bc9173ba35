//! Process-wide authentication state.
//!
//! `AuthContext` is the single source of truth for who is signed in. It is
//! constructed in the loading state, rehydrated once from the session
//! store, and from then on changes only through `login`, `logout` and the
//! teardown triggered by a rejected API call. Consumers hold a reference to
//! it; there is no global.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, ApiRequest, Backend};
use crate::models::{AuthUser, Role, RoleRequirement, Session, SessionNotice};
use crate::routing::LOGIN_PATH;
use crate::storage::KeyValueStore;

use super::{AuthError, AuthService, SessionStore};

/// Name shown in the header when nobody is signed in
const FALLBACK_DISPLAY_NAME: &str = "Admin";

/// In-memory projection of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<AuthUser>,
    pub authenticated: bool,
    pub loading: bool,
}

impl AuthState {
    /// State before the session store has been read.
    pub fn loading() -> Self {
        Self {
            user: None,
            authenticated: false,
            loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            authenticated: false,
            loading: false,
        }
    }

    pub fn signed_in(user: AuthUser) -> Self {
        Self {
            user: Some(user),
            authenticated: true,
            loading: false,
        }
    }

    pub fn role(&self) -> Option<&Role> {
        self.user.as_ref().map(|u| &u.role)
    }

    /// Role check used by views and the route guard.
    ///
    /// With no user present this is always false, `Any` included.
    pub fn has_role(&self, required: &RoleRequirement) -> bool {
        match self.role() {
            Some(role) => required.is_satisfied_by(role),
            None => false,
        }
    }
}

pub struct AuthContext<B, S> {
    service: AuthService<B>,
    store: SessionStore<S>,
    session: Option<Session>,
    state: AuthState,
    initialized: bool,
    notice: Option<SessionNotice>,
    forced_redirect: Option<String>,
}

impl<B: Backend, S: KeyValueStore> AuthContext<B, S> {
    pub fn new(service: AuthService<B>, store: SessionStore<S>) -> Self {
        Self {
            service,
            store,
            session: None,
            state: AuthState::loading(),
            initialized: false,
            notice: None,
            forced_redirect: None,
        }
    }

    /// Rehydrate from the session store. Runs once; later calls are no-ops.
    pub fn initialize(&mut self) {
        if self.initialized {
            debug!("Auth context already initialized");
            return;
        }
        self.initialized = true;

        match self.store.read() {
            Some(session) => {
                debug!(username = %session.username, role = %session.role, "Session restored");
                self.state = AuthState::signed_in(session.user());
                self.session = Some(session);
            }
            None => {
                debug!("No stored session");
                self.state = AuthState::signed_out();
            }
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.state.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn service(&self) -> &AuthService<B> {
        &self.service
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    /// Sign in and persist the session.
    ///
    /// The store write and the state update succeed together or not at
    /// all. Returns the role so the caller can pick a landing view.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Role, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let grant = match self.service.login(username, password).await {
            Ok(grant) => grant,
            Err(e) => {
                error!(error = %e, "Login failed");
                return Err(e);
            }
        };

        let session = grant.into_session(username);
        // A failed write has already cleared the store, previous session included
        if let Err(e) = self.store.write(&session) {
            error!(error = %e, "Could not persist session");
            self.teardown();
            return Err(e.into());
        }

        let role = session.role.clone();
        self.state = AuthState::signed_in(session.user());
        self.session = Some(session);
        self.initialized = true;
        self.notice = None;
        self.forced_redirect = None;
        info!(username, %role, "Signed in");
        Ok(role)
    }

    /// Sign out. The server call is best effort; local teardown always
    /// happens once it settles.
    pub async fn logout(&mut self) {
        if let Some(ref session) = self.session {
            if let Err(e) = self.service.logout(session).await {
                warn!(error = %e, "Server-side logout failed, clearing local session anyway");
            }
        }
        self.teardown();
        info!("Signed out");
    }

    /// Authenticated API call for views.
    ///
    /// Every view request goes through here. A rejected credential tears
    /// the session down and forces navigation to login, no matter which
    /// view made the call. The login view gets an expiry notice only when
    /// there was a session to end.
    pub async fn request(&mut self, request: &ApiRequest) -> Result<Value, ApiError> {
        let token = self.session.as_ref().map(|s| s.access_token.clone());
        let result = self.service.backend().send(request, token.as_deref()).await;

        if let Err(ref e) = result {
            if e.is_auth_rejected() {
                self.expire();
            }
        }
        result
    }

    fn expire(&mut self) {
        if self.session.is_some() {
            warn!("Backend rejected the session, signing out");
            self.notice = Some(SessionNotice::expired());
        } else {
            debug!("Unauthenticated request rejected");
        }
        self.teardown();
        self.forced_redirect = Some(LOGIN_PATH.to_string());
    }

    fn teardown(&mut self) {
        self.store.clear();
        self.session = None;
        self.state = AuthState::signed_out();
    }

    /// Pending forced navigation, if a teardown asked for one.
    pub fn take_forced_redirect(&mut self) -> Option<String> {
        self.forced_redirect.take()
    }

    /// Notice for the login view, shown once.
    pub fn take_notice(&mut self) -> Option<SessionNotice> {
        self.notice.take()
    }

    pub fn has_role(&self, required: &RoleRequirement) -> bool {
        self.state.has_role(required)
    }

    pub fn is_admin(&self) -> bool {
        self.state.role() == Some(&Role::Admin)
    }

    pub fn is_employee(&self) -> bool {
        self.state.role() == Some(&Role::Employee)
    }

    /// Name for the header.
    pub fn display_name(&self) -> &str {
        self.user()
            .map(|u| u.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::auth::session::{EMPLOYEE_ID_KEY, NAME_KEY, REFRESH_TOKEN_KEY, ROLE_KEY};
    use crate::routing::{self, Decision, Redirect, ADMIN_HOME, EMPLOYEE_HOME};
    use crate::storage::{MemoryStore, StorageError};
    use crate::testing::{alice_session, ScriptedBackend};

    type TestContext = AuthContext<ScriptedBackend, MemoryStore>;

    fn context() -> TestContext {
        AuthContext::new(
            AuthService::new(ScriptedBackend::new()),
            SessionStore::new(MemoryStore::new()),
        )
    }

    fn context_with_stored(session: &Session) -> TestContext {
        let mut store = SessionStore::new(MemoryStore::new());
        store.write(session).unwrap();
        AuthContext::new(AuthService::new(ScriptedBackend::new()), store)
    }

    fn backend(ctx: &TestContext) -> &ScriptedBackend {
        ctx.service().backend()
    }

    fn alice_login_response() -> Value {
        json!({
            "access": "T1",
            "refresh": "R1",
            "role": "employee",
            "employee_id": "E42",
            "name": "Alice"
        })
    }

    // -------------------------------------------------------------------------
    // Initialization
    // -------------------------------------------------------------------------

    #[test]
    fn test_fresh_load_without_session() {
        let mut ctx = context();
        assert!(ctx.is_loading());
        assert_eq!(routing::navigate("/dashboard", ctx.state()), Some(Decision::Pending));

        ctx.initialize();
        assert!(!ctx.is_loading());
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.user(), None);

        for path in ["/dashboard", "/employees", "/my-profile"] {
            assert_eq!(
                routing::navigate(path, ctx.state()),
                Some(Decision::Redirect(Redirect::to_login(path)))
            );
        }
    }

    #[test]
    fn test_initialize_restores_session() {
        let mut ctx = context_with_stored(&alice_session());
        ctx.initialize();

        assert!(ctx.is_authenticated());
        assert_eq!(ctx.user(), Some(&alice_session().user()));
        assert!(ctx.is_employee());
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_initialize_runs_once() {
        let mut ctx = context();
        ctx.initialize();
        assert!(!ctx.is_authenticated());

        // A session appearing later is not picked up by a second call
        let mut store = SessionStore::new(MemoryStore::new());
        store.write(&alice_session()).unwrap();
        ctx.store = store;
        ctx.initialize();
        assert!(!ctx.is_authenticated());
        assert!(!ctx.is_loading());
    }

    // -------------------------------------------------------------------------
    // has_role
    // -------------------------------------------------------------------------

    #[test]
    fn test_has_role_without_user_is_false_even_for_any() {
        let mut ctx = context();
        ctx.initialize();
        assert!(!ctx.has_role(&RoleRequirement::Any));
        assert!(!ctx.has_role(&RoleRequirement::staff()));
        assert!(!ctx.has_role(&Role::Admin.into()));
    }

    #[test]
    fn test_has_role_set_membership() {
        let mut ctx = context_with_stored(&alice_session());
        ctx.initialize();

        let both: RoleRequirement = vec![Role::Admin, Role::Employee].into();
        assert!(ctx.has_role(&both));
        assert!(ctx.has_role(&RoleRequirement::Any));
        assert!(ctx.has_role(&Role::Employee.into()));
        assert!(!ctx.has_role(&Role::Admin.into()));

        let mut admin = alice_session();
        admin.role = Role::Admin;
        let mut ctx = context_with_stored(&admin);
        ctx.initialize();
        assert!(ctx.has_role(&both));
        assert!(!ctx.has_role(&Role::Employee.into()));
    }

    // -------------------------------------------------------------------------
    // Login
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_rejected_leaves_everything_signed_out() {
        let mut ctx = context();
        ctx.initialize();
        backend(&ctx).push_status(401, json!({"error": "Invalid credentials"}));

        let err = ctx.login("admin", "wrongpass").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.user(), None);
        assert!(ctx.store().backend().is_empty());
        // A failed login is not a session expiry
        assert_eq!(ctx.take_forced_redirect(), None);
    }

    #[tokio::test]
    async fn test_login_employee_persists_and_routes() {
        let mut ctx = context();
        ctx.initialize();
        backend(&ctx).push_ok(alice_login_response());

        let role = ctx.login("alice", "pw").await.unwrap();
        assert_eq!(role, Role::Employee);

        let stored = ctx.store().backend();
        assert_eq!(stored.get("access_token").unwrap().as_deref(), Some("T1"));
        assert_eq!(stored.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("R1"));
        assert_eq!(stored.get(ROLE_KEY).unwrap().as_deref(), Some("employee"));
        assert_eq!(stored.get(EMPLOYEE_ID_KEY).unwrap().as_deref(), Some("E42"));
        assert_eq!(stored.get(NAME_KEY).unwrap().as_deref(), Some("Alice"));

        assert_eq!(
            ctx.user(),
            Some(&AuthUser {
                username: "alice".to_string(),
                name: "Alice".to_string(),
                role: Role::Employee,
                employee_id: Some("E42".to_string()),
            })
        );
        assert!(ctx.has_role(&Role::Employee.into()));

        assert_eq!(
            routing::navigate("/payroll", ctx.state()),
            Some(Decision::Redirect(Redirect::to(EMPLOYEE_HOME)))
        );
        assert_eq!(routing::navigate("/my-payroll", ctx.state()), Some(Decision::Allow));
    }

    #[tokio::test]
    async fn test_login_without_role_is_admin() {
        let mut ctx = context();
        ctx.initialize();
        backend(&ctx).push_ok(json!({"access": "T7", "refresh": "R7"}));

        assert_eq!(ctx.login("admin", "admin").await.unwrap(), Role::Admin);
        assert!(ctx.is_admin());
        assert_eq!(ctx.display_name(), "admin");
        assert_eq!(routing::navigate("/employees", ctx.state()), Some(Decision::Allow));
        assert_eq!(
            routing::navigate("/my-profile", ctx.state()),
            Some(Decision::Redirect(Redirect::to(ADMIN_HOME)))
        );
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let mut ctx = context();
        ctx.initialize();
        assert!(matches!(
            ctx.login("", "pw").await,
            Err(AuthError::MissingCredentials)
        ));
        assert!(backend(&ctx).calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_with_unwritable_store_stays_signed_out() {
        struct ReadOnly;
        impl KeyValueStore for ReadOnly {
            fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
                Ok(None)
            }
            fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
                Err(StorageError::Unavailable("read-only".to_string()))
            }
            fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
                Ok(())
            }
        }

        let mut ctx = AuthContext::new(
            AuthService::new(ScriptedBackend::new()),
            SessionStore::new(ReadOnly),
        );
        ctx.initialize();
        ctx.service().backend().push_ok(alice_login_response());

        let err = ctx.login("alice", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Storage(_)));
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.user(), None);
    }

    #[tokio::test]
    async fn test_failed_relogin_signs_out_completely() {
        /// Accepts every write except the given access token.
        struct RejectsToken(MemoryStore, &'static str);
        impl KeyValueStore for RejectsToken {
            fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
                self.0.get(key)
            }
            fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
                if value == self.1 {
                    return Err(StorageError::Unavailable("quota exceeded".to_string()));
                }
                self.0.set(key, value)
            }
            fn remove(&mut self, key: &str) -> Result<(), StorageError> {
                self.0.remove(key)
            }
        }

        let mut store = SessionStore::new(RejectsToken(MemoryStore::new(), "T2"));
        store.write(&alice_session()).unwrap();
        let mut ctx = AuthContext::new(AuthService::new(ScriptedBackend::new()), store);
        ctx.initialize();
        assert!(ctx.is_authenticated());

        ctx.service()
            .backend()
            .push_ok(json!({"access": "T2", "role": "admin", "name": "Bob"}));
        let err = ctx.login("bob", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Storage(_)));

        // Memory and storage agree: nobody is signed in
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.user(), None);
        assert_eq!(ctx.store().read(), None);
        assert!(ctx.store().backend().0.is_empty());
    }

    #[tokio::test]
    async fn test_server_message_reaches_login_view() {
        let mut ctx = context();
        ctx.initialize();
        backend(&ctx).push_status(500, json!({"error": "Account locked, contact HR"}));
        let err = ctx.login("alice", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "Account locked, contact HR");

        backend(&ctx).push_status(404, json!({"error": "No such user"}));
        let err = ctx.login("alice", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "No such user");
        assert!(!ctx.is_authenticated());
    }

    #[tokio::test]
    async fn test_empty_error_field_is_invalid_credentials() {
        let mut ctx = context();
        ctx.initialize();
        backend(&ctx).push_status(401, json!({"error": ""}));
        let err = ctx.login("alice", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), crate::auth::error::INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_login_over_corrupt_session_file() {
        use crate::storage::FileStore;
        use crate::testing::scratch_dir;

        let dir = scratch_dir("context_corrupt_file");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(crate::storage::file::SESSION_FILE), "{not json").unwrap();

        let mut ctx = AuthContext::new(
            AuthService::new(ScriptedBackend::new()),
            SessionStore::new(FileStore::in_dir(dir.clone())),
        );
        ctx.initialize();
        assert!(!ctx.is_authenticated());

        ctx.service().backend().push_ok(alice_login_response());
        assert_eq!(ctx.login("alice", "pw").await.unwrap(), Role::Employee);
        assert_eq!(ctx.store().read(), Some(alice_session()));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_transport_failure_is_generic_message() {
        let mut ctx = context();
        ctx.initialize();
        backend(&ctx).push_err(ApiError::InvalidResponse("<html>oops</html>".to_string()));

        let err = ctx.login("alice", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), crate::auth::error::SERVER_ERROR);
        assert!(!ctx.is_authenticated());
    }

    // -------------------------------------------------------------------------
    // Logout
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_logout_clears_even_when_server_fails() {
        let mut ctx = context_with_stored(&alice_session());
        ctx.initialize();
        backend(&ctx).push_err(ApiError::ServerError("boom".to_string()));

        ctx.logout().await;
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.user(), None);
        assert!(ctx.store().backend().is_empty());

        let calls = backend(&ctx).calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].request.body, Some(json!({"refresh": "R1"})));
    }

    #[tokio::test]
    async fn test_logout_when_signed_out_skips_network() {
        let mut ctx = context();
        ctx.initialize();
        ctx.logout().await;
        assert!(backend(&ctx).calls().is_empty());
        assert!(!ctx.is_authenticated());
    }

    // -------------------------------------------------------------------------
    // Rejected session during a view call
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_rejected_request_tears_down_and_redirects() {
        let mut ctx = context_with_stored(&alice_session());
        ctx.initialize();
        backend(&ctx).push_ok(json!([{"id": 1}]));
        backend(&ctx).push_status(401, json!({"detail": "Token is invalid or expired"}));

        let leaves = ctx.request(&ApiRequest::get("leaves/")).await.unwrap();
        assert_eq!(leaves, json!([{"id": 1}]));
        assert_eq!(ctx.take_forced_redirect(), None);

        let err = ctx.request(&ApiRequest::get("holidays/")).await.unwrap_err();
        assert!(err.is_auth_rejected());
        assert!(!ctx.is_authenticated());
        assert!(ctx.store().backend().is_empty());
        assert_eq!(ctx.take_forced_redirect().as_deref(), Some(LOGIN_PATH));
        assert_eq!(
            ctx.take_notice().map(|n| n.message),
            Some(crate::models::session::SESSION_EXPIRED_MESSAGE.to_string())
        );

        // Both calls carried the bearer token
        let calls = backend(&ctx).calls();
        assert!(calls.iter().all(|c| c.token.as_deref() == Some("T1")));

        // Notice and redirect are one-shot
        assert_eq!(ctx.take_forced_redirect(), None);
        assert_eq!(ctx.take_notice(), None);
    }

    #[tokio::test]
    async fn test_rejected_request_while_signed_out_has_no_notice() {
        let mut ctx = context();
        ctx.initialize();
        backend(&ctx).push_status(401, json!({}));

        let err = ctx.request(&ApiRequest::get("leaves/")).await.unwrap_err();
        assert!(err.is_auth_rejected());
        assert_eq!(backend(&ctx).calls()[0].token, None);
        assert_eq!(ctx.take_forced_redirect().as_deref(), Some(LOGIN_PATH));
        assert_eq!(ctx.take_notice(), None);
    }

    #[tokio::test]
    async fn test_other_errors_keep_session() {
        let mut ctx = context_with_stored(&alice_session());
        ctx.initialize();
        backend(&ctx).push_status(403, json!({"error": "Admins only"}));

        let err = ctx.request(&ApiRequest::get("payroll/")).await.unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied(_)));
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.take_forced_redirect(), None);
    }

    #[tokio::test]
    async fn test_login_after_expiry_clears_notice() {
        let mut ctx = context_with_stored(&alice_session());
        ctx.initialize();
        backend(&ctx).push_status(401, json!({}));
        let _ = ctx.request(&ApiRequest::get("leaves/")).await;
        assert!(!ctx.is_authenticated());

        backend(&ctx).push_ok(alice_login_response());
        ctx.login("alice", "pw").await.unwrap();
        assert_eq!(ctx.take_notice(), None);
        assert_eq!(ctx.take_forced_redirect(), None);
    }

    #[test]
    fn test_display_name_fallback() {
        let mut ctx = context();
        ctx.initialize();
        assert_eq!(ctx.display_name(), "Admin");

        let mut ctx = context_with_stored(&alice_session());
        ctx.initialize();
        assert_eq!(ctx.display_name(), "Alice");
    }
}
