//! Navigation against the live session.

use std::sync::Arc;

use staffdesk_access::{post_login_redirect, GuardOutcome, RouteGuard};

use crate::SessionStore;

/// Runs the route guard against a session's current resolution.
///
/// Nothing is cached: every call re-reads the session, so a logout between
/// two navigations is picked up by the second one.
pub struct Navigator {
    session: Arc<SessionStore>,
    guard: RouteGuard,
}

impl Navigator {
    /// Navigator with the standard route table.
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self::with_guard(session, RouteGuard::default())
    }

    /// Navigator with a custom guard.
    pub fn with_guard(session: Arc<SessionStore>, guard: RouteGuard) -> Self {
        Self { session, guard }
    }

    /// The guard in use.
    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    /// Decides whether `path` renders or redirects to the login page.
    pub async fn navigate(&self, path: &str) -> GuardOutcome {
        let resolution = self.session.resolution().await;
        self.guard.check(resolution, path)
    }

    /// Where to land after a login that started at `from`.
    ///
    /// `None` when nobody is logged in.
    pub async fn landing_after_login(&self, from: &str) -> Option<String> {
        let identity = self.session.current().await?;
        Some(post_login_redirect(identity.role.as_str(), from))
    }
}
