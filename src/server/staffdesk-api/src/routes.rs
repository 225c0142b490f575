//! HTTP routes.

use std::sync::Arc;

use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{ApiError, TokenIssuer, UserDirectory, UserView};

/// Shared state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Known accounts.
    pub users: Arc<UserDirectory>,
    /// Token signer.
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    /// Creates the state.
    pub fn new(users: UserDirectory, tokens: TokenIssuer) -> Self {
        Self {
            users: Arc::new(users),
            tokens: Arc::new(tokens),
        }
    }
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct TokenBody {
    access_token: String,
    token_type: &'static str,
    user: UserView,
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<TokenBody>, ApiError> {
    let user = state
        .users
        .authenticate(&body.username, &body.password)
        .inspect_err(|e| warn!(username = %body.username, error = %e, "Login rejected"))?;

    let access_token = state.tokens.issue(user)?;
    info!(username = %user.username, role = %user.role, "Issued token");

    Ok(Json(TokenBody {
        access_token,
        token_type: "bearer",
        user: UserView::from(user),
    }))
}

async fn me(State(state): State<AppState>, BearerToken(token): BearerToken) -> Result<Json<UserView>, ApiError> {
    let claims = state.tokens.verify(&token)?;

    let user = state
        .users
        .find(&claims.sub)
        .filter(|u| u.id == claims.uid && u.is_active)
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".into()))?;

    Ok(Json(UserView::from(user)))
}

/// Raw token from an `Authorization: Bearer` header.
struct BearerToken(String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;

        let (scheme, token) = header
            .split_once(' ')
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;

        if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
            return Err(ApiError::Unauthorized("Not authenticated".into()));
        }

        Ok(BearerToken(token.trim().to_string()))
    }
}
