//! Route guard: decides whether a navigation may render its view.
//!
//! The guard never navigates itself. It returns a `Decision` and the shell
//! that asked performs the redirect.

use crate::auth::AuthState;
use crate::models::RoleRequirement;

use super::routes::{home_for, LOGIN_PATH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
    /// Location the user asked for, kept so login can return there.
    pub from: Option<String>,
}

impl Redirect {
    pub fn to(path: &str) -> Self {
        Self {
            to: path.to_string(),
            from: None,
        }
    }

    pub fn to_login(requested: &str) -> Self {
        Self {
            to: LOGIN_PATH.to_string(),
            from: Some(requested.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Auth state is still loading; render a neutral placeholder.
    Pending,
    Allow,
    Redirect(Redirect),
}

/// Evaluate one navigation attempt against the current auth state.
pub fn evaluate(allowed: &RoleRequirement, state: &AuthState, requested: &str) -> Decision {
    if state.loading {
        return Decision::Pending;
    }

    if !state.authenticated {
        return Decision::Redirect(Redirect::to_login(requested));
    }

    if !state.has_role(allowed) {
        // Wrong role is never an error; send the user home quietly
        return match state.role() {
            Some(role) => Decision::Redirect(Redirect::to(home_for(role))),
            None => Decision::Redirect(Redirect::to_login(requested)),
        };
    }

    Decision::Allow
}
