//! Integration tests for the Staffdesk login flow.
//!
//! These tests run the authentication service in-process on an ephemeral
//! port and drive the client session layer against it over real HTTP.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use staffdesk_api::{router, AppState, TokenConfig, TokenIssuer, UserDirectory};
use staffdesk_auth::{
    Authenticator, HttpAuthBackend, HttpAuthConfig, Navigator, SessionConfig, SessionStore,
};
use staffdesk_storage_sqlite::SqliteBackend;
use tempfile::TempDir;
use tokio::task::JoinHandle;

const TEST_SECRET: &str = "integration-test-secret-32-bytes-min";

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// Test Server
// ============================================================================

/// An authentication service running on a background task.
pub struct TestServer {
    task: JoinHandle<()>,
    pub base_url: String,
}

impl TestServer {
    /// Starts a server with one seeded account per role.
    pub async fn start() -> Result<Self> {
        let users = UserDirectory::dev_seeded().context("Failed to seed users")?;
        Self::start_with(users).await
    }

    /// Starts a server over the given accounts.
    pub async fn start_with(users: UserDirectory) -> Result<Self> {
        Self::start_with_tokens(users, TokenConfig::new(TEST_SECRET)).await
    }

    /// Starts a server over the given accounts and token settings.
    pub async fn start_with_tokens(users: UserDirectory, config: TokenConfig) -> Result<Self> {
        let tokens = TokenIssuer::new(config).context("Bad token config")?;
        let app = router(AppState::new(users, tokens));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind test listener")?;
        let addr = listener.local_addr()?;

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            task,
            base_url: format!("http://{addr}"),
        };
        server.wait_for_ready().await?;
        Ok(server)
    }

    /// Wait for the server to be ready to accept connections.
    async fn wait_for_ready(&self) -> Result<()> {
        let client = Client::new();
        let url = format!("{}/api/health", self.base_url);

        for _ in 0..50 {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }

        bail!("Server failed to start within 5 seconds")
    }

    /// Fetches `/api/health`.
    pub async fn health(&self) -> Result<HealthResponse> {
        let resp = Client::new()
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await?;
        Ok(resp.json().await?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Test Console
// ============================================================================

/// Client side wired the way the CLI wires it: SQLite session store,
/// HTTP backend, authenticator and navigator.
pub struct TestConsole {
    pub session: Arc<SessionStore>,
    pub backend: Arc<HttpAuthBackend>,
    pub auth: Authenticator,
    pub navigator: Navigator,
}

impl TestConsole {
    /// Opens the `profile` session under `data_dir` and restores it.
    pub async fn open(base_url: &str, data_dir: &Path, profile: &str) -> Result<Self> {
        Self::open_with(base_url, data_dir, profile, SessionConfig::default()).await
    }

    /// Like [`open`](Self::open) with explicit session settings.
    pub async fn open_with(
        base_url: &str,
        data_dir: &Path,
        profile: &str,
        config: SessionConfig,
    ) -> Result<Self> {
        let storage = SqliteBackend::open(data_dir, profile).await?;
        let session = Arc::new(SessionStore::with_config(Arc::new(storage), config));
        session.init().await?;

        let backend = Arc::new(HttpAuthBackend::new(HttpAuthConfig {
            api_url: base_url.to_string(),
            timeout: Some(Duration::from_secs(10)),
        })?);

        Ok(Self {
            auth: Authenticator::new(backend.clone(), session.clone()),
            navigator: Navigator::new(session.clone()),
            session,
            backend,
        })
    }
}

/// Fresh temporary data directory.
pub fn data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use staffdesk_access::{GuardOutcome, GuardState, Role};
    use staffdesk_api::{hash_password, UserRecord};
    use staffdesk_auth::LoginOutcome;

    #[tokio::test]
    async fn test_server_health() {
        let server = TestServer::start().await.unwrap();

        let health = server.health().await.unwrap();

        assert_eq!(health.status, "ok");
        assert!(!health.version.is_empty());
    }

    #[tokio::test]
    async fn test_login_lands_on_role_dashboard() {
        let server = TestServer::start().await.unwrap();
        let dir = data_dir();
        let console = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();

        let cases = [
            ("admin", "/admin/dashboard"),
            ("reception", "/reception/dashboard"),
            ("salesman", "/salesman/dashboard"),
            ("service_engineer", "/engineer/dashboard"),
            ("office_staff", "/"),
            ("customer", "/customer"),
        ];

        for (username, dashboard) in cases {
            let outcome = console.auth.login(username, &format!("{username}-dev")).await;
            assert!(outcome.is_success(), "{username}: {outcome:?}");
            assert_eq!(
                console.navigator.landing_after_login("/").await.as_deref(),
                Some(dashboard),
                "{username}"
            );
        }
    }

    #[tokio::test]
    async fn test_login_keeps_staff_origin() {
        let server = TestServer::start().await.unwrap();
        let dir = data_dir();
        let console = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();

        assert!(console.auth.login("reception", "reception-dev").await.is_success());
        assert_eq!(
            console.navigator.landing_after_login("/reception/enquiries").await.as_deref(),
            Some("/reception/enquiries")
        );
        assert_eq!(
            console.navigator.landing_after_login("/products").await.as_deref(),
            Some("/reception/dashboard")
        );
    }

    #[tokio::test]
    async fn test_wrong_password_reports_service_message() {
        let server = TestServer::start().await.unwrap();
        let dir = data_dir();
        let console = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();

        let outcome = console.auth.login("admin", "wrong").await;

        assert_eq!(
            outcome,
            LoginOutcome::Failure {
                error: "Incorrect username or password".into()
            }
        );
        assert!(!console.session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_inactive_account_is_refused() {
        let users = UserDirectory::new(vec![UserRecord {
            id: 9,
            username: "former".into(),
            full_name: None,
            email: None,
            role: Role::Salesman,
            department: None,
            is_active: false,
            password_hash: hash_password("pw").unwrap(),
        }])
        .unwrap();
        let server = TestServer::start_with(users).await.unwrap();
        let dir = data_dir();
        let console = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();

        let outcome = console.auth.login("former", "pw").await;
        assert_eq!(outcome.error(), Some("Inactive user"));
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_cleanly() {
        let dir = data_dir();
        let console = TestConsole::open("http://127.0.0.1:1", dir.path(), "desk").await.unwrap();

        let outcome = console.auth.login("admin", "admin-dev").await;

        assert!(!outcome.is_success());
        assert!(!outcome.error().unwrap().is_empty());
        assert!(!console.session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let server = TestServer::start().await.unwrap();
        let dir = data_dir();

        {
            let console = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();
            assert!(console.auth.login("salesman", "salesman-dev").await.is_success());
        }

        let console = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();
        let identity = console.session.current().await.unwrap();
        assert_eq!(identity.username, "salesman");
        assert_eq!(identity.role, Role::Salesman);

        // The persisted token is still accepted by the service.
        let profile = console.backend.me(&identity.token).await.unwrap();
        assert_eq!(profile.id, identity.id);
    }

    #[tokio::test]
    async fn test_expired_session_dropped_on_restart() {
        let users = UserDirectory::dev_seeded().unwrap();
        let config = TokenConfig {
            ttl: Duration::from_secs(1),
            ..TokenConfig::new(TEST_SECRET)
        };
        let server = TestServer::start_with_tokens(users, config).await.unwrap();
        let dir = data_dir();
        let strict = SessionConfig {
            reject_expired_tokens: true,
            ..SessionConfig::default()
        };

        {
            let console = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();
            assert!(console.auth.login("customer", "customer-dev").await.is_success());
        }

        tokio::time::sleep(Duration::from_millis(2500)).await;

        // Lenient restore keeps the record; the service no longer accepts it.
        let lenient = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();
        let identity = lenient.session.current().await.unwrap();
        assert!(lenient.backend.me(&identity.token).await.is_err());
        drop(lenient);

        let console = TestConsole::open_with(&server.base_url, dir.path(), "desk", strict)
            .await
            .unwrap();
        assert!(!console.session.is_authenticated().await);
        assert_eq!(console.navigator.navigate("/customer").await.state(), GuardState::Denied);

        // The stale record is gone for good.
        let console = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();
        assert!(!console.session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_logout_survives_restart() {
        let server = TestServer::start().await.unwrap();
        let dir = data_dir();

        {
            let console = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();
            assert!(console.auth.login("admin", "admin-dev").await.is_success());
            console.auth.logout().await.unwrap();
        }

        let console = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();
        assert!(!console.session.is_authenticated().await);
        assert_eq!(
            console.navigator.navigate("/admin/dashboard").await.state(),
            GuardState::Denied
        );
    }

    #[tokio::test]
    async fn test_profiles_are_isolated() {
        let server = TestServer::start().await.unwrap();
        let dir = data_dir();

        let front = TestConsole::open(&server.base_url, dir.path(), "front").await.unwrap();
        let field = TestConsole::open(&server.base_url, dir.path(), "field").await.unwrap();

        assert!(front.auth.login("reception", "reception-dev").await.is_success());
        assert!(field.auth.login("service_engineer", "service_engineer-dev").await.is_success());

        assert_eq!(
            front.navigator.navigate("/reception/dashboard").await,
            GuardOutcome::Render
        );
        assert_eq!(
            field.navigator.navigate("/reception/dashboard").await.state(),
            GuardState::Denied
        );
        assert_eq!(
            field.navigator.navigate("/engineer/dashboard/jobs").await,
            GuardOutcome::Render
        );
    }

    #[tokio::test]
    async fn test_permissions_follow_logged_in_role() {
        let server = TestServer::start().await.unwrap();
        let dir = data_dir();
        let console = TestConsole::open(&server.base_url, dir.path(), "desk").await.unwrap();

        assert!(console.auth.login("office_staff", "office_staff-dev").await.is_success());
        assert!(console.session.can_access_mif().await);
        assert!(console.session.can_access_module("office-staff").await);
        assert!(!console.session.can_access_module("admin").await);
        assert!(!console.session.has_permission("viewFinancials").await);

        assert!(console.auth.login("admin", "admin-dev").await.is_success());
        assert!(console.session.has_permission("viewFinancials").await);
        assert!(console.session.can_access_module("admin").await);
    }
}
