//! User directory.
//!
//! Accounts are read from a TOML file:
//!
//! ```toml
//! [[users]]
//! id = 1
//! username = "meera"
//! full_name = "Meera Iyer"
//! role = "RECEPTION"
//! password_hash = "$argon2id$v=19$..."
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use staffdesk_access::Role;
use tracing::debug;

use crate::ApiError;

const INCORRECT_CREDENTIALS: &str = "Incorrect username or password";

/// One account as stored in the users file.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
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
    /// Department label.
    #[serde(default)]
    pub department: Option<String>,
    /// Inactive accounts cannot log in.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Argon2 PHC string.
    pub password_hash: String,
}

fn default_active() -> bool {
    true
}

/// User object sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    /// Account identifier.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Display name.
    pub full_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Staff role.
    pub role: Role,
    /// Department label.
    pub department: Option<String>,
    /// Whether the account may log in.
    pub is_active: bool,
}

impl From<&UserRecord> for UserView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
            department: user.department.clone(),
            is_active: user.is_active,
        }
    }
}

#[derive(Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<UserRecord>,
}

/// Read-only set of accounts.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Vec<UserRecord>,
}

impl UserDirectory {
    /// Builds a directory, rejecting duplicate ids or usernames and
    /// unparseable password hashes.
    pub fn new(users: Vec<UserRecord>) -> Result<Self, ApiError> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();

        for user in &users {
            if user.username.trim().is_empty() {
                return Err(ApiError::Configuration(format!("user {} has an empty username", user.id)));
            }
            if !ids.insert(user.id) {
                return Err(ApiError::Configuration(format!("duplicate user id {}", user.id)));
            }
            if !names.insert(user.username.as_str()) {
                return Err(ApiError::Configuration(format!(
                    "duplicate username '{}'",
                    user.username
                )));
            }
            PasswordHash::new(&user.password_hash).map_err(|e| {
                ApiError::Configuration(format!("invalid password hash for '{}': {e}", user.username))
            })?;
        }

        Ok(Self { users })
    }

    /// Parses a users file.
    pub fn from_toml_str(content: &str) -> Result<Self, ApiError> {
        let file: UsersFile = toml::from_str(content)
            .map_err(|e| ApiError::Configuration(format!("invalid users file: {e}")))?;
        Self::new(file.users)
    }

    /// Loads a users file from disk.
    pub async fn load(path: &Path) -> Result<Self, ApiError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ApiError::Configuration(format!("cannot read users file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// One account per role, named after the role in lower case, with
    /// password `<username>-dev`.
    pub fn dev_seeded() -> Result<Self, ApiError> {
        let hasher = dev_hasher()?;
        let users = Role::ALL
            .iter()
            .zip(1..)
            .map(|(role, id)| {
                let username = role.as_str().to_lowercase();
                let password_hash = hash_with(&hasher, &format!("{username}-dev"))?;
                Ok(UserRecord {
                    id,
                    full_name: Some(format!("Dev {role}")),
                    email: Some(format!("{username}@staffdesk.local")),
                    role: *role,
                    department: None,
                    is_active: true,
                    password_hash,
                    username,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;
        Self::new(users)
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the directory has no accounts.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Looks up an account by login name.
    pub fn find(&self, username: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Checks a username and password.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<&UserRecord, ApiError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::BadRequest("username and password are required".into()));
        }

        let Some(user) = self.find(username) else {
            debug!(username, "Unknown username");
            // Same Argon2 cost as a known account.
            if let Some(hash) = decoy_hash() {
                let _ = verify_password(password, hash);
            }
            return Err(ApiError::Unauthorized(INCORRECT_CREDENTIALS.into()));
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(ApiError::Unauthorized(INCORRECT_CREDENTIALS.into()));
        }

        if !user.is_active {
            return Err(ApiError::Forbidden("Inactive user".into()));
        }

        Ok(user)
    }
}

/// Hash checked for unknown usernames. Its plaintext starts with NUL.
fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| hash_password("\0staffdesk-unknown-user").ok())
        .as_deref()
}

/// Cheap parameters for seeded development accounts.
fn dev_hasher() -> Result<Argon2<'static>, ApiError> {
    let params = Params::new(1024, 1, 1, None).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn hash_with(hasher: &Argon2<'_>, password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Hashes a password with default Argon2id parameters.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    hash_with(&Argon2::default(), password)
}

/// Checks a password against an Argon2 PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiError::Configuration(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
