//! REST authentication backend.
//!
//! Talks to `POST {api_url}/api/auth/login` and `GET {api_url}/api/auth/me`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::{AuthBackend, AuthError, Credentials, Identity, LoginRequest, LoginResponse, UserProfile};

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Configuration for [`HttpAuthBackend`].
#[derive(Debug, Clone)]
pub struct HttpAuthConfig {
    /// API base URL, e.g. `http://localhost:8000`.
    pub api_url: String,
    /// Request timeout. `None` keeps the HTTP client default (no timeout).
    pub timeout: Option<Duration>,
}

impl Default for HttpAuthConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: None,
        }
    }
}

impl HttpAuthConfig {
    /// Configuration for `api_url` with no timeout.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            timeout: None,
        }
    }
}

/// Error body. The service sends `{"error": ...}`; FastAPI-style
/// `{"detail": ...}` bodies are accepted too.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        self.error
            .or_else(|| match self.detail {
                Some(serde_json::Value::String(detail)) => Some(detail),
                _ => None,
            })
            .filter(|m| !m.trim().is_empty())
    }
}

/// [`AuthBackend`] backed by the REST login endpoint.
pub struct HttpAuthBackend {
    client: Client,
    base_url: String,
}

impl HttpAuthBackend {
    /// Creates a backend for the given configuration.
    pub fn new(config: HttpAuthConfig) -> Result<Self, AuthError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AuthError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetches the profile behind a bearer token.
    pub async fn me(&self, token: &str) -> Result<UserProfile, AuthError> {
        let resp = self
            .client
            .get(self.url("/api/auth/me"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        resp.json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))
    }

    /// Maps a non-success response to an error.
    async fn error_from(resp: Response) -> AuthError {
        let status = resp.status();
        let message = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(ErrorBody::message);

        match status {
            StatusCode::UNAUTHORIZED => message
                .map(AuthError::Rejected)
                .unwrap_or(AuthError::InvalidCredentials),
            StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY => {
                AuthError::Rejected(message.unwrap_or_else(|| status_reason(status)))
            },
            _ => AuthError::Server {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| status_reason(status)),
            },
        }
    }
}

fn status_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string()
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let req = LoginRequest {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        };

        debug!(username = %credentials.username, url = %self.url("/api/auth/login"), "Sending login request");

        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&req)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let body: LoginResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        if body.access_token.trim().is_empty() {
            return Err(AuthError::MalformedResponse("empty access token".into()));
        }

        Ok(body.into_identity())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
