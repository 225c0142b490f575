//! Post-login redirector.

use crate::{Role, RoleProfile};

/// Path prefixes of the authenticated staff sections.
pub const STAFF_PREFIXES: &[&str] = &[
    "/admin",
    "/reception",
    "/salesman",
    "/engineer",
    "/service-engineer",
    "/office",
    "/employee",
    "/dashboard",
];

/// Fallback landing page.
const ROOT_PATH: &str = "/";

/// Dashboard path for a role name (case-insensitive). Unknown roles, and
/// roles without a dashboard, land on `/`.
pub fn dashboard_route(role: &str) -> &'static str {
    role.parse::<Role>()
        .ok()
        .and_then(|role| RoleProfile::of(role).dashboard)
        .unwrap_or(ROOT_PATH)
}

/// Whether `path` lies in a staff section. Prefixes match on segment
/// boundaries, so `/administrator` is not under `/admin`.
pub fn is_staff_route(path: &str) -> bool {
    STAFF_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
    })
}

/// Landing path after login.
///
/// A deep link into a staff section is returned unchanged, whether or not
/// `role` may view it (the route guard decides that on render). Anything
/// else lands on the role's dashboard.
pub fn post_login_redirect(role: &str, from: &str) -> String {
    if is_staff_route(from) {
        from.to_string()
    } else {
        dashboard_route(role).to_string()
    }
}
