//! Route guard.
//!
//! Evaluated on every navigation. The guard never caches a decision: each
//! call looks at the current session resolution and the target's
//! allow-list. ADMIN is unioned into every allow-list here, so rule authors
//! never have to list it.

use serde::Serialize;

use crate::{Role, RouteTable};

/// Path of the login page.
pub const LOGIN_PATH: &str = "/login";

/// What the session layer knows about the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Persisted session not yet restored.
    Pending,
    /// Restored, nobody logged in.
    Anonymous,
    /// Restored, logged in with this role.
    Authenticated(Role),
}

/// Guard state for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    /// Auth status not resolved yet.
    Unknown,
    /// The view may render.
    Authorized,
    /// Redirected to login.
    Denied,
}

/// Redirect to the login page that remembers the requested path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRedirect {
    /// Login page path.
    pub to: String,
    /// Path originally requested.
    pub from: String,
}

impl LoginRedirect {
    /// Browser location, e.g. `/login?from=%2Fadmin%2Fproducts`.
    pub fn location(&self) -> String {
        format!("{}?from={}", self.to, urlencoding::encode(&self.from))
    }
}

/// Result of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Render nothing until the session is restored.
    Pending,
    /// Render the requested view.
    Render,
    /// Send the user to login.
    Redirect(LoginRedirect),
}

impl GuardOutcome {
    /// State machine position for this outcome.
    pub fn state(&self) -> GuardState {
        match self {
            GuardOutcome::Pending => GuardState::Unknown,
            GuardOutcome::Render => GuardState::Authorized,
            GuardOutcome::Redirect(_) => GuardState::Denied,
        }
    }
}

/// Checks navigations against a [`RouteTable`].
#[derive(Debug, Clone)]
pub struct RouteGuard {
    table: RouteTable,
    login_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(RouteTable::standard())
    }
}

impl RouteGuard {
    /// Creates a guard over `table` redirecting to [`LOGIN_PATH`].
    pub fn new(table: RouteTable) -> Self {
        Self {
            table,
            login_path: LOGIN_PATH.to_string(),
        }
    }

    /// Overrides the login page path.
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Route table in use.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Evaluates a navigation to `path`.
    pub fn check(&self, resolution: Resolution, path: &str) -> GuardOutcome {
        self.check_allow_list(resolution, self.table.allow_list(path), path)
    }

    /// Evaluates a navigation to `path` guarded by an explicit allow-list.
    ///
    /// An empty allow-list is public and renders even before the session
    /// is restored.
    pub fn check_allow_list(
        &self,
        resolution: Resolution,
        allow_list: &[Role],
        path: &str,
    ) -> GuardOutcome {
        if allow_list.is_empty() {
            return GuardOutcome::Render;
        }

        match resolution {
            Resolution::Pending => GuardOutcome::Pending,
            Resolution::Authenticated(role) if permits(role, allow_list) => GuardOutcome::Render,
            Resolution::Authenticated(_) | Resolution::Anonymous => {
                GuardOutcome::Redirect(LoginRedirect {
                    to: self.login_path.clone(),
                    from: path.to_string(),
                })
            },
        }
    }
}

/// Allow-list membership with the implicit ADMIN member.
fn permits(role: Role, allow_list: &[Role]) -> bool {
    role == Role::Admin || allow_list.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> RouteGuard {
        RouteGuard::default()
    }

    #[test]
    fn test_reception_denied_on_admin_only_list() {
        let outcome = guard().check_allow_list(
            Resolution::Authenticated(Role::Reception),
            &[Role::Admin],
            "/admin/settings",
        );

        assert_eq!(
            outcome,
            GuardOutcome::Redirect(LoginRedirect {
                to: "/login".into(),
                from: "/admin/settings".into(),
            })
        );
        assert_eq!(outcome.state(), GuardState::Denied);
    }

    #[test]
    fn test_reception_allowed_when_listed() {
        let outcome = guard().check_allow_list(
            Resolution::Authenticated(Role::Reception),
            &[Role::Reception, Role::Admin],
            "/reception/dashboard",
        );
        assert_eq!(outcome, GuardOutcome::Render);
        assert_eq!(outcome.state(), GuardState::Authorized);
    }

    #[test]
    fn test_admin_is_implicit_member() {
        let outcome = guard().check_allow_list(
            Resolution::Authenticated(Role::Admin),
            &[Role::Salesman],
            "/salesman/orders",
        );
        assert_eq!(outcome, GuardOutcome::Render);
    }

    #[test]
    fn test_pending_renders_nothing_on_protected_route() {
        let outcome = guard().check(Resolution::Pending, "/salesman/dashboard");
        assert_eq!(outcome, GuardOutcome::Pending);
        assert_eq!(outcome.state(), GuardState::Unknown);
    }

    #[test]
    fn test_public_routes_render_for_everyone() {
        let guard = guard();
        for resolution in [
            Resolution::Pending,
            Resolution::Anonymous,
            Resolution::Authenticated(Role::Customer),
        ] {
            assert_eq!(guard.check(resolution, "/products/12"), GuardOutcome::Render);
            assert_eq!(guard.check(resolution, "/no-such-page"), GuardOutcome::Render);
        }
    }

    #[test]
    fn test_anonymous_redirected_with_origin() {
        let outcome = guard().check(Resolution::Anonymous, "/reception/visitors");
        match outcome {
            GuardOutcome::Redirect(redirect) => {
                assert_eq!(redirect.from, "/reception/visitors");
                assert_eq!(redirect.location(), "/login?from=%2Freception%2Fvisitors");
            },
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn test_standard_table_decisions() {
        let guard = guard();
        let salesman = Resolution::Authenticated(Role::Salesman);
        let reception = Resolution::Authenticated(Role::Reception);

        assert_eq!(guard.check(salesman, "/salesman/followups"), GuardOutcome::Render);
        assert_eq!(guard.check(salesman, "/enquiries/3"), GuardOutcome::Render);
        assert!(matches!(
            guard.check(salesman, "/admin/products"),
            GuardOutcome::Redirect(_)
        ));
        assert_eq!(
            guard.check(reception, "/admin/sales-performance"),
            GuardOutcome::Render
        );
        assert!(matches!(
            guard.check(reception, "/admin/audit-logs"),
            GuardOutcome::Redirect(_)
        ));
    }

    #[test]
    fn test_path_spelling_does_not_bypass_allow_list() {
        let guard = guard();
        let salesman = Resolution::Authenticated(Role::Salesman);

        for path in ["/Admin/audit-logs", "/ADMIN/settings", "/admin/./dashboard"] {
            assert_eq!(guard.check(Resolution::Anonymous, path).state(), GuardState::Denied, "{path}");
        }
        for path in [
            "/salesman/../admin/audit-logs",
            "/salesman/%2e%2e/admin/audit-logs",
            "/../admin",
        ] {
            assert_eq!(guard.check(salesman, path).state(), GuardState::Denied, "{path}");
        }
        assert_eq!(guard.check(salesman, "/Salesman/Orders"), GuardOutcome::Render);
    }

    #[test]
    fn test_every_navigation_is_reevaluated() {
        let guard = guard();
        let engineer = Resolution::Authenticated(Role::ServiceEngineer);

        assert_eq!(guard.check(engineer, "/service-engineer/jobs"), GuardOutcome::Render);
        assert!(matches!(
            guard.check(engineer, "/reception/calls"),
            GuardOutcome::Redirect(_)
        ));
        assert_eq!(guard.check(engineer, "/engineer/dashboard"), GuardOutcome::Render);
    }

    #[test]
    fn test_custom_login_path() {
        let guard = RouteGuard::default().with_login_path("/staff/login");
        match guard.check(Resolution::Anonymous, "/customer") {
            GuardOutcome::Redirect(redirect) => assert_eq!(redirect.to, "/staff/login"),
            other => panic!("expected redirect, got {other:?}"),
        }
    }
}
