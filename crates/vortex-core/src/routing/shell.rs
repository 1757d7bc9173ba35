use crate::auth::AuthState;
use crate::models::Role;

use super::guard::{Decision, Redirect};
use super::routes::{ShellKind, ADMIN_HOME, LOGIN_PATH};

impl ShellKind {
    /// The shell's own check, applied after the route guard has allowed a
    /// view. Shells do not remember where the user was headed.
    pub fn check(&self, state: &AuthState) -> Decision {
        if *self == ShellKind::Public {
            return Decision::Allow;
        }
        if state.loading {
            return Decision::Pending;
        }
        if !state.authenticated {
            return Decision::Redirect(Redirect::to(LOGIN_PATH));
        }
        // Admins never see self-service screens, even by typing the URL
        if *self == ShellKind::Employee && state.role() == Some(&Role::Admin) {
            return Decision::Redirect(Redirect::to(ADMIN_HOME));
        }
        Decision::Allow
    }
}
