//! Authenticator.
//!
//! Turns a username and password into an [`Identity`] and stores it in the
//! [`SessionStore`]. Every failure, whatever its cause, comes back as a
//! [`LoginOutcome::Failure`] carrying a message for the login view.
//!
//! Each attempt runs under a [`CancellationToken`]. Starting a new attempt
//! cancels the one in flight, and [`Authenticator::cancel_pending`] abandons
//! it outright. A cancelled attempt never touches the session, even when
//! the backend has already answered.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{AuthBackend, AuthError, Credentials, Identity, SessionStore};

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Logged in; the session now holds `user`.
    Success {
        /// The authenticated identity.
        user: Identity,
    },
    /// Not logged in; the session is untouched.
    Failure {
        /// Human-readable reason, never empty.
        error: String,
    },
}

impl LoginOutcome {
    fn failure(error: &AuthError) -> Self {
        LoginOutcome::Failure {
            error: error.to_string(),
        }
    }

    /// Whether the login succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success { .. })
    }

    /// The identity on success.
    pub fn user(&self) -> Option<&Identity> {
        match self {
            LoginOutcome::Success { user } => Some(user),
            LoginOutcome::Failure { .. } => None,
        }
    }

    /// The message on failure.
    pub fn error(&self) -> Option<&str> {
        match self {
            LoginOutcome::Success { .. } => None,
            LoginOutcome::Failure { error } => Some(error),
        }
    }
}

struct PendingAttempt {
    id: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Attempts {
    next_id: u64,
    pending: Option<PendingAttempt>,
}

/// Logs users in and out of a [`SessionStore`].
pub struct Authenticator {
    backend: Arc<dyn AuthBackend>,
    session: Arc<SessionStore>,
    attempts: Mutex<Attempts>,
}

impl Authenticator {
    /// Creates an authenticator writing into `session`.
    pub fn new(backend: Arc<dyn AuthBackend>, session: Arc<SessionStore>) -> Self {
        Self {
            backend,
            session,
            attempts: Mutex::new(Attempts::default()),
        }
    }

    /// Session written by this authenticator.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Single login attempt, no retry.
    pub async fn login(&self, username: &str, password: &str) -> LoginOutcome {
        self.run(Credentials::new(username, password), None).await
    }

    /// Like [`login`](Self::login), additionally abandoned when `cancel`
    /// fires (for example when the calling view goes away).
    pub async fn login_with_cancel(
        &self,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> LoginOutcome {
        self.run(Credentials::new(username, password), Some(cancel))
            .await
    }

    /// Abandons the attempt in flight, if any.
    pub async fn cancel_pending(&self) {
        if let Some(pending) = self.attempts.lock().await.pending.take() {
            pending.cancel.cancel();
        }
    }

    /// Logs out: abandons any attempt in flight and clears the session.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.cancel_pending().await;
        self.session.clear().await?;
        info!("Logged out");
        Ok(())
    }

    async fn run(&self, credentials: Credentials, parent: Option<&CancellationToken>) -> LoginOutcome {
        if !credentials.is_complete() {
            return LoginOutcome::failure(&AuthError::MissingCredentials);
        }

        let (id, cancel) = self.begin(parent).await;
        let outcome = self.attempt(&credentials, &cancel).await;
        self.finish(id).await;
        outcome
    }

    async fn begin(&self, parent: Option<&CancellationToken>) -> (u64, CancellationToken) {
        let mut attempts = self.attempts.lock().await;
        if let Some(previous) = attempts.pending.take() {
            previous.cancel.cancel();
        }

        let cancel = parent
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        attempts.next_id += 1;
        let id = attempts.next_id;
        attempts.pending = Some(PendingAttempt {
            id,
            cancel: cancel.clone(),
        });
        (id, cancel)
    }

    async fn finish(&self, id: u64) {
        let mut attempts = self.attempts.lock().await;
        if attempts.pending.as_ref().is_some_and(|p| p.id == id) {
            attempts.pending = None;
        }
    }

    async fn attempt(&self, credentials: &Credentials, cancel: &CancellationToken) -> LoginOutcome {
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(AuthError::Cancelled),
            result = self.backend.login(credentials) => result,
        };

        let identity = match result {
            Ok(identity) => identity,
            Err(e) => {
                warn!(username = %credentials.username, backend = self.backend.name(), error = %e, "Login failed");
                return LoginOutcome::failure(&e);
            },
        };

        // Checked under the attempts lock so cancel_pending() cannot slip in
        // between the check and the session write.
        let _attempts = self.attempts.lock().await;
        if cancel.is_cancelled() {
            return LoginOutcome::failure(&AuthError::Cancelled);
        }

        if let Err(e) = self.session.set(identity.clone()).await {
            warn!(username = %credentials.username, error = %e, "Could not persist session");
            return LoginOutcome::failure(&e);
        }

        info!(username = %identity.username, role = %identity.role, "Logged in");
        LoginOutcome::Success { user: identity }
    }
}
