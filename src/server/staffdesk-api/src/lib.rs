//! # Staffdesk API
//!
//! REST authentication service for the Staffdesk console.
//!
//! ## Endpoints
//!
//! - `POST /api/auth/login` - Exchange username and password for a bearer token
//! - `GET /api/auth/me` - Profile behind a bearer token
//! - `GET /api/health` - Liveness probe

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod routes;
pub mod tokens;
pub mod users;

pub use error::ApiError;
pub use routes::{router, AppState};
pub use tokens::{Claims, TokenConfig, TokenIssuer, DEFAULT_TOKEN_TTL};
pub use users::{hash_password, verify_password, UserDirectory, UserRecord, UserView};
