//! Session store.
//!
//! Holds the identity currently logged in and mirrors it to a
//! [`StorageBackend`] under a single key. One store holds at most one
//! identity. Stores are plain values: create one per client (or per test)
//! and share it through an `Arc`.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use staffdesk_access::{Resolution, Role, RoleMatch};
use staffdesk_storage::StorageBackend;

use crate::{AuthError, Identity};

/// Storage key of the persisted identity.
pub const SESSION_KEY: &str = "session/identity";

/// Session store settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Storage key of the persisted identity.
    pub key: String,
    /// Discard a restored session whose token is a JWT past its `exp`.
    /// Opaque tokens are never considered expired.
    pub reject_expired_tokens: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key: SESSION_KEY.to_string(),
            reject_expired_tokens: false,
        }
    }
}

#[derive(Debug)]
enum SessionState {
    /// `restore()` has not completed.
    Restoring,
    /// Restored; `None` when logged out.
    Ready(Option<Identity>),
}

/// The single source of truth for who is logged in.
pub struct SessionStore {
    storage: Arc<dyn StorageBackend>,
    config: SessionConfig,
    state: RwLock<SessionState>,
}

impl SessionStore {
    /// Creates a store over `storage` with the default key.
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self::with_config(storage, SessionConfig::default())
    }

    /// Creates a store with explicit settings.
    pub fn with_config(storage: Arc<dyn StorageBackend>, config: SessionConfig) -> Self {
        Self {
            storage,
            config,
            state: RwLock::new(SessionState::Restoring),
        }
    }

    /// Starts the store's lifecycle. Same as [`restore`](Self::restore).
    pub async fn init(&self) -> Result<Option<Identity>, AuthError> {
        self.restore().await
    }

    /// Ends the store's lifecycle: forgets the in-memory identity and goes
    /// back to the unresolved state. The persisted record is kept.
    pub async fn dispose(&self) {
        *self.state.write().await = SessionState::Restoring;
    }

    /// Loads the persisted identity.
    ///
    /// A missing record means logged out. A record that does not parse, has
    /// no token, or (when configured) carries an expired JWT is deleted and
    /// also means logged out. If storage cannot be read the store resolves
    /// as logged out and the error is returned.
    pub async fn restore(&self) -> Result<Option<Identity>, AuthError> {
        let restored = self.load().await;

        let identity = restored.as_ref().ok().cloned().flatten();
        *self.state.write().await = SessionState::Ready(identity);

        restored
    }

    async fn load(&self) -> Result<Option<Identity>, AuthError> {
        let Some(bytes) = self.storage.get(&self.config.key).await? else {
            debug!("No persisted session");
            return Ok(None);
        };

        let identity = match serde_json::from_slice::<Identity>(&bytes) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted session");
                self.storage.delete(&self.config.key).await?;
                return Ok(None);
            },
        };

        if !identity.has_token() {
            debug!(username = %identity.username, "Discarding persisted session without token");
            self.storage.delete(&self.config.key).await?;
            return Ok(None);
        }

        if self.config.reject_expired_tokens && token_expired(&identity.token) {
            debug!(username = %identity.username, "Discarding persisted session with expired token");
            self.storage.delete(&self.config.key).await?;
            return Ok(None);
        }

        info!(username = %identity.username, role = %identity.role, "Session restored");
        Ok(Some(identity))
    }

    /// Replaces the current identity and persists it, token included.
    ///
    /// Nothing changes if the write fails.
    pub async fn set(&self, identity: Identity) -> Result<(), AuthError> {
        let bytes = serde_json::to_vec(&identity)
            .map_err(|e| AuthError::Storage(format!("serialization failed: {e}")))?;
        self.storage.put(&self.config.key, &bytes).await?;

        *self.state.write().await = SessionState::Ready(Some(identity));
        Ok(())
    }

    /// Logs out: forgets the identity and deletes the persisted record.
    ///
    /// The in-memory identity is dropped even if the delete fails.
    pub async fn clear(&self) -> Result<(), AuthError> {
        *self.state.write().await = SessionState::Ready(None);
        self.storage.delete(&self.config.key).await?;
        Ok(())
    }

    /// The identity logged in, if any.
    pub async fn current(&self) -> Option<Identity> {
        match &*self.state.read().await {
            SessionState::Ready(identity) => identity.clone(),
            SessionState::Restoring => None,
        }
    }

    /// Whether `restore()` has completed.
    pub async fn is_restored(&self) -> bool {
        matches!(&*self.state.read().await, SessionState::Ready(_))
    }

    /// Whether someone is logged in.
    pub async fn is_authenticated(&self) -> bool {
        self.current_role().await.is_some()
    }

    /// What the route guard should assume.
    pub async fn resolution(&self) -> Resolution {
        match &*self.state.read().await {
            SessionState::Restoring => Resolution::Pending,
            SessionState::Ready(None) => Resolution::Anonymous,
            SessionState::Ready(Some(identity)) => Resolution::Authenticated(identity.role),
        }
    }

    async fn current_role(&self) -> Option<Role> {
        match &*self.state.read().await {
            SessionState::Ready(Some(identity)) => Some(identity.role),
            _ => None,
        }
    }

    /// Capability check for the current user; `false` when logged out.
    pub async fn has_permission(&self, capability: &str) -> bool {
        self.current_role()
            .await
            .is_some_and(|role| staffdesk_access::has_permission(role.as_str(), capability))
    }

    /// Role check for the current user; `false` when logged out.
    pub async fn has_role<'a>(&self, expected: impl Into<RoleMatch<'a>>) -> bool {
        let expected = expected.into();
        self.current_role()
            .await
            .is_some_and(|role| expected.matches(role))
    }

    /// Module check for the current user; `false` when logged out.
    pub async fn can_access_module(&self, module: &str) -> bool {
        self.current_role()
            .await
            .is_some_and(|role| staffdesk_access::can_access_module(role, module))
    }

    /// Whether the current user may open MIF records.
    pub async fn can_access_mif(&self) -> bool {
        self.has_permission("accessMIF").await
    }
}

#[derive(Deserialize)]
struct ExpiryClaims {
    #[allow(dead_code)]
    exp: u64,
}

/// Reads the `exp` claim of a JWT without checking its signature.
///
/// Only a well-formed JWT whose `exp` has passed counts as expired.
fn token_expired(token: &str) -> bool {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    validation.leeway = 0;

    match decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(_) => false,
        Err(e) => matches!(e.kind(), ErrorKind::ExpiredSignature),
    }
}
