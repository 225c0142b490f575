//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while logging in or managing the session.
///
/// The [`Authenticator`](crate::Authenticator) flattens these into a
/// message; the variants only matter below that boundary.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password missing.
    #[error("username and password are required")]
    MissingCredentials,

    /// Invalid credentials without a more specific server message.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The service refused the login and said why.
    #[error("{0}")]
    Rejected(String),

    /// The service answered with an unexpected status.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the body, or the status reason.
        message: String,
    },

    /// The service could not be reached.
    #[error("could not reach the authentication service: {0}")]
    Transport(String),

    /// A success response whose body could not be read.
    #[error("unexpected response from the authentication service: {0}")]
    MalformedResponse(String),

    /// The login attempt was superseded or abandoned.
    #[error("login cancelled")]
    Cancelled,

    /// Backend configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Reading or writing the persisted session failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<staffdesk_storage::StorageError> for AuthError {
    fn from(e: staffdesk_storage::StorageError) -> Self {
        AuthError::Storage(e.to_string())
    }
}
