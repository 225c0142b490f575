//! Canonical role table.
//!
//! Every per-role fact lives in one [`RoleProfile`]: the capability set, the
//! console modules, the restricted route patterns the role may render and
//! its dashboard. The module map and the standard route table are derived
//! from these profiles.

use crate::{Capability, Module, Role, RoleMatch};

/// Access profile of one role.
#[derive(Debug)]
pub struct RoleProfile {
    /// Role described by this profile.
    pub role: Role,
    /// Capabilities granted (everything else is denied).
    pub capabilities: &'static [Capability],
    /// Console modules the role may open.
    pub modules: &'static [Module],
    /// Restricted route patterns the role may render.
    pub routes: &'static [&'static str],
    /// Landing page after login, if the role has one.
    pub dashboard: Option<&'static str>,
}

static PROFILES: [RoleProfile; 6] = [
    RoleProfile {
        role: Role::Admin,
        capabilities: &Capability::ALL,
        modules: &Module::ALL,
        routes: &["/admin/*", "/products/add", "/products/edit/:productId"],
        dashboard: Some("/admin/dashboard"),
    },
    RoleProfile {
        role: Role::OfficeStaff,
        capabilities: &[
            Capability::AccessMif,
            Capability::ViewAllCustomers,
            Capability::ViewReports,
            Capability::ManageProducts,
            Capability::ManageServices,
        ],
        modules: &[Module::OfficeStaff],
        routes: &[],
        dashboard: None,
    },
    RoleProfile {
        role: Role::Reception,
        capabilities: &[Capability::ViewAllCustomers, Capability::ManageReception],
        modules: &[Module::Reception],
        routes: &[
            "/reception/*",
            "/enquiries/:enquiryId",
            "/admin/sales-performance",
        ],
        dashboard: Some("/reception/dashboard"),
    },
    RoleProfile {
        role: Role::Salesman,
        capabilities: &[],
        modules: &[Module::Salesman],
        routes: &["/salesman/*", "/employee/salesman", "/enquiries/:enquiryId"],
        dashboard: Some("/salesman/dashboard"),
    },
    RoleProfile {
        role: Role::ServiceEngineer,
        capabilities: &[],
        modules: &[Module::ServiceEngineer],
        routes: &[
            "/service-engineer/*",
            "/employee/service-engineer/*",
            "/engineer/dashboard/*",
        ],
        dashboard: Some("/engineer/dashboard"),
    },
    RoleProfile {
        role: Role::Customer,
        capabilities: &[],
        modules: &[Module::Customer],
        routes: &["/customer"],
        dashboard: Some("/customer"),
    },
];

impl RoleProfile {
    /// Returns the profile of `role`.
    pub fn of(role: Role) -> &'static RoleProfile {
        let index = match role {
            Role::Admin => 0,
            Role::OfficeStaff => 1,
            Role::Reception => 2,
            Role::Salesman => 3,
            Role::ServiceEngineer => 4,
            Role::Customer => 5,
        };
        &PROFILES[index]
    }

    /// Every profile, ADMIN first.
    pub fn all() -> &'static [RoleProfile] {
        &PROFILES
    }

    /// Checks whether the profile grants `capability`.
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Answers "can `role` do `capability`" from wire names.
///
/// Fails closed: an unknown role or capability yields `false`.
pub fn has_permission(role: &str, capability: &str) -> bool {
    match (role.parse::<Role>(), capability.parse::<Capability>()) {
        (Ok(role), Ok(capability)) => RoleProfile::of(role).allows(capability),
        _ => false,
    }
}

/// Checks a role against a single role or a role list.
pub fn has_role<'a>(role: Role, expected: impl Into<RoleMatch<'a>>) -> bool {
    expected.into().matches(role)
}

/// Coarse module check. ADMIN may open every module; unknown modules are
/// denied to everyone.
pub fn can_access_module(role: Role, module: &str) -> bool {
    match module.parse::<Module>() {
        Ok(module) => RoleProfile::of(role).modules.contains(&module),
        Err(_) => false,
    }
}
