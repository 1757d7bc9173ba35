//! Identity types shared by the auth layer and the route guard.

pub mod role;
pub mod session;

pub use role::{Role, RoleRequirement};
pub use session::{AuthUser, Session, SessionNotice};
