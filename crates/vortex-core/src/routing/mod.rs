//! Role-gated routing.
//!
//! `navigate` is what a front end calls on every location change: it
//! resolves the view, runs the route guard and then the view's layout
//! shell check, and hands back a single `Decision`.

pub mod guard;
pub mod routes;
pub mod shell;

use crate::auth::AuthState;

pub use guard::{evaluate, Decision, Redirect};
pub use routes::{home_for, ShellKind, View, ADMIN_HOME, EMPLOYEE_HOME, LOGIN_PATH};

/// Decide a navigation to `location`. `None` means no view matches.
pub fn navigate(location: &str, state: &AuthState) -> Option<Decision> {
    let view = View::resolve(location)?;
    Some(decide(view, location, state))
}

/// Decide a navigation to an already resolved view.
pub fn decide(view: View, location: &str, state: &AuthState) -> Decision {
    if view.is_public() {
        return Decision::Allow;
    }

    match evaluate(&view.allowed_roles(), state, location) {
        Decision::Allow => {}
        other => return other,
    }

    match view.shell().check(state) {
        Decision::Allow => {}
        other => return other,
    }

    // The index only forwards to the role's dashboard
    if view == View::Index {
        if let Some(role) = state.role() {
            return Decision::Redirect(Redirect::to(home_for(role)));
        }
    }

    Decision::Allow
}
