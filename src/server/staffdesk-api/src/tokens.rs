//! Bearer token issuing and validation.
//!
//! Tokens are HS256 JWTs signed with a shared secret.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use staffdesk_access::Role;

use crate::{ApiError, UserRecord};

/// Default token lifetime: one working day.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(8 * 60 * 60);

/// Minimum secret length accepted outside tests.
const MIN_SECRET_LEN: usize = 32;

/// Token settings.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HS256 signing secret.
    pub secret: String,
    /// Token lifetime.
    pub ttl: Duration,
}

impl TokenConfig {
    /// Settings with the default lifetime.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,
    /// Account identifier.
    pub uid: i64,
    /// Staff role at issue time.
    pub role: Role,
    /// Issued at (Unix seconds).
    pub iat: u64,
    /// Expiration (Unix seconds).
    pub exp: u64,
}

/// Signs and checks bearer tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    /// Creates an issuer. Secrets shorter than 32 bytes are rejected.
    pub fn new(config: TokenConfig) -> Result<Self, ApiError> {
        if config.secret.len() < MIN_SECRET_LEN {
            return Err(ApiError::Configuration(format!(
                "JWT secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if config.ttl.is_zero() {
            return Err(ApiError::Configuration("token TTL must be positive".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: config.ttl,
        })
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user`.
    pub fn issue(&self, user: &UserRecord) -> Result<String, ApiError> {
        let iat = unix_now()?;
        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id,
            role: user.role,
            iat,
            exp: iat + self.ttl.as_secs(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }

    /// Validates a token and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::Unauthorized("Token expired".into()),
                _ => ApiError::Unauthorized("Invalid token".into()),
            })
    }
}

fn unix_now() -> Result<u64, ApiError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| ApiError::Internal(format!("system clock before epoch: {e}")))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-minimum-32-chars!";

    fn user() -> UserRecord {
        UserRecord {
            id: 42,
            username: "kiran".into(),
            full_name: None,
            email: None,
            role: Role::ServiceEngineer,
            department: None,
            is_active: true,
            password_hash: String::new(),
        }
    }

    fn signed(claims: &Claims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new(TokenConfig::new(SECRET)).unwrap();
        let token = issuer.issue(&user()).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "kiran");
        assert_eq!(claims.uid, 42);
        assert_eq!(claims.role, Role::ServiceEngineer);
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL.as_secs());
    }

    #[test]
    fn test_expired_token() {
        let issuer = TokenIssuer::new(TokenConfig::new(SECRET)).unwrap();
        let now = unix_now().unwrap();
        let claims = Claims {
            sub: "kiran".into(),
            uid: 42,
            role: Role::ServiceEngineer,
            iat: now - 7200,
            exp: now - 3600,
        };

        let err = issuer.verify(&signed(&claims, SECRET)).unwrap_err();
        assert_eq!(err.to_string(), "Token expired");
    }

    #[test]
    fn test_invalid_signature() {
        let issuer = TokenIssuer::new(TokenConfig::new(SECRET)).unwrap();
        let other = TokenIssuer::new(TokenConfig::new("different-secret-key-minimum-32!")).unwrap();
        let token = other.issue(&user()).unwrap();

        assert!(matches!(issuer.verify(&token), Err(ApiError::Unauthorized(_))));
        assert!(matches!(issuer.verify("garbage"), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_rejects_weak_config() {
        assert!(TokenIssuer::new(TokenConfig::new("short")).is_err());

        let config = TokenConfig {
            secret: SECRET.into(),
            ttl: Duration::ZERO,
        };
        assert!(TokenIssuer::new(config).is_err());
    }
}
