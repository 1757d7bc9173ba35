use std::fmt;

/// Role carried by a session.
///
/// The backend only issues `admin` and `employee`. Any other value is kept
/// verbatim in `Other` so it never silently gains admin capabilities; it
/// matches no route unless a route names it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Employee,
    Other(String),
}

impl Role {
    /// Parse a role string exactly as the backend sent it.
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            "employee" => Role::Employee,
            other => Role::Other(other.to_string()),
        }
    }

    /// Apply the compatibility default: a missing or empty role means admin.
    ///
    /// Older backends did not send a role at all and only had admin users.
    pub fn or_default(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => Self::parse(s),
            _ => Role::Admin,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::Other(s) => s,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role requirement checked by `AuthState::has_role`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Any signed-in user.
    Any,
    /// Exactly this role.
    Only(Role),
    /// Any role in the set.
    OneOf(Vec<Role>),
}

impl RoleRequirement {
    /// Default requirement for a route: both built-in roles.
    pub fn staff() -> Self {
        RoleRequirement::OneOf(vec![Role::Admin, Role::Employee])
    }

    pub fn is_satisfied_by(&self, role: &Role) -> bool {
        match self {
            RoleRequirement::Any => true,
            RoleRequirement::Only(required) => required == role,
            RoleRequirement::OneOf(roles) => roles.contains(role),
        }
    }
}

impl Default for RoleRequirement {
    fn default() -> Self {
        Self::staff()
    }
}

impl From<Role> for RoleRequirement {
    fn from(role: Role) -> Self {
        RoleRequirement::Only(role)
    }
}

impl From<Vec<Role>> for RoleRequirement {
    fn from(roles: Vec<Role>) -> Self {
        RoleRequirement::OneOf(roles)
    }
}
