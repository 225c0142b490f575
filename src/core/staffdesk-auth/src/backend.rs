//! Authentication backend trait.

use async_trait::async_trait;

use crate::{AuthError, Identity};

/// Username and password as typed by the user.
#[derive(Clone)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields present (whitespace-only usernames count as missing).
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

/// Trait for services that exchange credentials for an identity.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Performs a single login attempt.
    ///
    /// # Returns
    ///
    /// * `Ok(Identity)` - The authenticated user with its bearer token
    /// * `Err(AuthError)` - Any failure: bad credentials, transport, server
    async fn login(&self, credentials: &Credentials) -> Result<Identity, AuthError>;

    /// Returns the name of this backend for logging/debugging.
    fn name(&self) -> &'static str;
}
