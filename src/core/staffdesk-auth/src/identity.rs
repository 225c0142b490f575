//! Identity and login wire types.

use std::fmt;

use serde::{Deserialize, Serialize};
use staffdesk_access::Role;

/// Authenticated user profile plus bearer token.
///
/// This is also the persisted session record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Account identifier.
    pub id: i64,

    /// Login name.
    pub username: String,

    /// Display name.
    #[serde(default)]
    pub full_name: Option<String>,

    /// Email address.
    #[serde(default)]
    pub email: Option<String>,

    /// Staff role.
    pub role: Role,

    /// Opaque bearer credential. Empty when a persisted record lacks one.
    #[serde(default)]
    pub token: String,
}

impl Identity {
    /// Combines a user profile with the token issued for it.
    pub fn from_profile(user: UserProfile, token: impl Into<String>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            token: token.into(),
        }
    }

    /// Name to show in the console header.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }

    /// Whether a bearer token is present.
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// User object returned by the authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account identifier.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Staff role.
    pub role: Role,
}

/// Body of `POST /api/auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Success body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    pub access_token: String,
    /// Token scheme, `"bearer"`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// The authenticated user.
    pub user: UserProfile,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl LoginResponse {
    /// Builds the session identity (`token = access_token`).
    pub fn into_identity(self) -> Identity {
        Identity::from_profile(self.user, self.access_token)
    }
}
