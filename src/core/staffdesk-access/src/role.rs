//! Roles, capabilities and console modules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AccessError;

/// Job function of a staff member.
///
/// Serialized as `SCREAMING_SNAKE_CASE` (`"SERVICE_ENGINEER"`). Parsing is
/// case-insensitive and accepts `-` in place of `_`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Role {
    /// Full access to every module and capability.
    Admin,
    /// Front desk: enquiries, calls, visitors.
    Reception,
    /// Field sales.
    Salesman,
    /// Field service and repairs.
    ServiceEngineer,
    /// Back office.
    OfficeStaff,
    /// External customer account.
    Customer,
}

impl Role {
    /// Every role, ADMIN first.
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Reception,
        Role::Salesman,
        Role::ServiceEngineer,
        Role::OfficeStaff,
        Role::Customer,
    ];

    /// Canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Reception => "RECEPTION",
            Role::Salesman => "SALESMAN",
            Role::ServiceEngineer => "SERVICE_ENGINEER",
            Role::OfficeStaff => "OFFICE_STAFF",
            Role::Customer => "CUSTOMER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| AccessError::UnknownRole(s.to_string()))
    }
}

impl TryFrom<String> for Role {
    type Error = AccessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Named boolean permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Machine installation file (MIF) records.
    #[serde(rename = "accessMIF")]
    AccessMif,
    /// Customer records beyond one's own assignments.
    ViewAllCustomers,
    /// Create and edit employee accounts.
    ManageEmployees,
    /// Reception desk operations.
    ManageReception,
    /// Reports and analytics.
    ViewReports,
    /// Product catalogue and stock.
    ManageProducts,
    /// Service catalogue and SLAs.
    ManageServices,
    /// Invoices, outstanding balances.
    ViewFinancials,
    /// Every console module.
    AccessAllModules,
}

impl Capability {
    /// Every capability in table order.
    pub const ALL: [Capability; 9] = [
        Capability::AccessMif,
        Capability::ViewAllCustomers,
        Capability::ManageEmployees,
        Capability::ManageReception,
        Capability::ViewReports,
        Capability::ManageProducts,
        Capability::ManageServices,
        Capability::ViewFinancials,
        Capability::AccessAllModules,
    ];

    /// Wire name, e.g. `"manageProducts"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::AccessMif => "accessMIF",
            Capability::ViewAllCustomers => "viewAllCustomers",
            Capability::ManageEmployees => "manageEmployees",
            Capability::ManageReception => "manageReception",
            Capability::ViewReports => "viewReports",
            Capability::ManageProducts => "manageProducts",
            Capability::ManageServices => "manageServices",
            Capability::ViewFinancials => "viewFinancials",
            Capability::AccessAllModules => "accessAllModules",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = AccessError;

    /// Exact, case-sensitive match on the wire name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|cap| cap.as_str() == s)
            .ok_or_else(|| AccessError::UnknownCapability(s.to_string()))
    }
}

/// Coarse-grained console module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Module {
    /// Customer portal.
    Customer,
    /// Reception desk.
    Reception,
    /// Salesman workspace.
    Salesman,
    /// Service engineer workspace.
    ServiceEngineer,
    /// Office staff workspace.
    OfficeStaff,
    /// Administration.
    Admin,
}

impl Module {
    /// Every module.
    pub const ALL: [Module; 6] = [
        Module::Customer,
        Module::Reception,
        Module::Salesman,
        Module::ServiceEngineer,
        Module::OfficeStaff,
        Module::Admin,
    ];

    /// Module name, e.g. `"service-engineer"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Module::Customer => "customer",
            Module::Reception => "reception",
            Module::Salesman => "salesman",
            Module::ServiceEngineer => "service-engineer",
            Module::OfficeStaff => "office-staff",
            Module::Admin => "admin",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|module| module.as_str() == s)
            .ok_or_else(|| AccessError::UnknownModule(s.to_string()))
    }
}

/// Argument of [`has_role`](crate::has_role): a single role or a list.
#[derive(Debug, Clone, Copy)]
pub enum RoleMatch<'a> {
    /// Exact match.
    One(Role),
    /// Membership in the list.
    Any(&'a [Role]),
}

impl RoleMatch<'_> {
    /// Checks `role` against this matcher.
    pub fn matches(&self, role: Role) -> bool {
        match self {
            RoleMatch::One(expected) => *expected == role,
            RoleMatch::Any(roles) => roles.contains(&role),
        }
    }
}

impl From<Role> for RoleMatch<'_> {
    fn from(role: Role) -> Self {
        RoleMatch::One(role)
    }
}

impl<'a> From<&'a [Role]> for RoleMatch<'a> {
    fn from(roles: &'a [Role]) -> Self {
        RoleMatch::Any(roles)
    }
}

impl<'a, const N: usize> From<&'a [Role; N]> for RoleMatch<'a> {
    fn from(roles: &'a [Role; N]) -> Self {
        RoleMatch::Any(roles)
    }
}
