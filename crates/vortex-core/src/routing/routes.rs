use crate::models::{Role, RoleRequirement};

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_HOME: &str = "/dashboard";
pub const EMPLOYEE_HOME: &str = "/employee-dashboard";

/// Layout shell a view renders inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Public,
    Admin,
    Employee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Login,
    SetPassword,
    Index,
    Dashboard,
    Employees,
    Recruitment,
    Onboarding,
    Attendance,
    Leave,
    Holidays,
    Payroll,
    Assets,
    Performance,
    Documents,
    Organization,
    Settings,
    EmployeeDashboard,
    MyProfile,
    MyAttendance,
    MyPayroll,
    EmployeeSettings,
}

impl View {
    pub const ALL: [View; 21] = [
        View::Login,
        View::SetPassword,
        View::Index,
        View::Dashboard,
        View::Employees,
        View::Recruitment,
        View::Onboarding,
        View::Attendance,
        View::Leave,
        View::Holidays,
        View::Payroll,
        View::Assets,
        View::Performance,
        View::Documents,
        View::Organization,
        View::Settings,
        View::EmployeeDashboard,
        View::MyProfile,
        View::MyAttendance,
        View::MyPayroll,
        View::EmployeeSettings,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            View::Login => LOGIN_PATH,
            View::SetPassword => "/set-password",
            View::Index => "/",
            View::Dashboard => ADMIN_HOME,
            View::Employees => "/employees",
            View::Recruitment => "/recruitment",
            View::Onboarding => "/onboarding",
            View::Attendance => "/attendance",
            View::Leave => "/leave",
            View::Holidays => "/holidays",
            View::Payroll => "/payroll",
            View::Assets => "/assets",
            View::Performance => "/performance",
            View::Documents => "/documents",
            View::Organization => "/organization",
            View::Settings => "/settings",
            View::EmployeeDashboard => EMPLOYEE_HOME,
            View::MyProfile => "/my-profile",
            View::MyAttendance => "/my-attendance",
            View::MyPayroll => "/my-payroll",
            View::EmployeeSettings => "/employee-settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Login => "Sign In",
            View::SetPassword => "Set Password",
            View::Index => "Home",
            View::Dashboard => "Dashboard",
            View::Employees => "Employees",
            View::Recruitment => "Recruitment",
            View::Onboarding => "Onboarding",
            View::Attendance => "Attendance",
            View::Leave => "Leave",
            View::Holidays => "Holidays",
            View::Payroll => "Payroll",
            View::Assets => "Assets",
            View::Performance => "Performance",
            View::Documents => "Documents",
            View::Organization => "Organization",
            View::Settings => "Settings",
            View::EmployeeDashboard => "My Dashboard",
            View::MyProfile => "My Profile",
            View::MyAttendance => "My Attendance",
            View::MyPayroll => "My Payroll",
            View::EmployeeSettings => "Settings",
        }
    }

    pub fn shell(&self) -> ShellKind {
        match self {
            View::Login | View::SetPassword => ShellKind::Public,
            View::EmployeeDashboard
            | View::MyProfile
            | View::MyAttendance
            | View::MyPayroll
            | View::EmployeeSettings => ShellKind::Employee,
            _ => ShellKind::Admin,
        }
    }

    pub fn is_public(&self) -> bool {
        self.shell() == ShellKind::Public
    }

    /// Roles the route guard lets through. Self-service views keep the
    /// default of both roles; the employee shell turns admins away.
    pub fn allowed_roles(&self) -> RoleRequirement {
        match self.shell() {
            ShellKind::Public => RoleRequirement::Any,
            ShellKind::Employee => RoleRequirement::staff(),
            ShellKind::Admin if *self == View::Index => RoleRequirement::staff(),
            ShellKind::Admin => RoleRequirement::Only(Role::Admin),
        }
    }

    /// Match a location to a view. Query strings and a trailing slash are
    /// ignored.
    pub fn resolve(location: &str) -> Option<View> {
        let path = location.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        View::ALL.into_iter().find(|v| v.path() == normalized)
    }
}

/// Landing view for a role. Employees get their dashboard; every other
/// role lands on the admin dashboard.
pub fn home_for(role: &Role) -> &'static str {
    match role {
        Role::Employee => EMPLOYEE_HOME,
        _ => ADMIN_HOME,
    }
}
