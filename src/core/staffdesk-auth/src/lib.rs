//! # Staffdesk Auth
//!
//! Client-side authentication for the Staffdesk console.
//!
//! ## Components
//!
//! - [`SessionStore`]: the identity currently logged in, mirrored to durable
//!   storage
//! - [`Authenticator`]: exchanges credentials for an [`Identity`] through an
//!   [`AuthBackend`]
//! - [`HttpAuthBackend`]: the REST login endpoint
//! - [`Navigator`]: runs the route guard and post-login redirector against
//!   a session

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authenticator;
pub mod backend;
pub mod error;
pub mod http;
pub mod identity;
pub mod navigator;
pub mod session;

pub use authenticator::{Authenticator, LoginOutcome};
pub use backend::{AuthBackend, Credentials};
pub use error::AuthError;
pub use http::{HttpAuthBackend, HttpAuthConfig, DEFAULT_API_URL};
pub use identity::{Identity, LoginRequest, LoginResponse, UserProfile};
pub use navigator::Navigator;
pub use session::{SessionConfig, SessionStore, SESSION_KEY};
