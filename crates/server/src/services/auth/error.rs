//! Authentication error types.

use thiserror::Error;

/// Errors raised while checking credentials or bearer tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// No `Authorization: Bearer` header on a protected request.
    #[error("missing bearer token")]
    MissingToken,

    /// Token failed signature, expiry or claim validation.
    #[error("invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),

    /// Argon2 could not hash the password.
    #[error("password hashing error")]
    PasswordHash,

    /// The blocking hashing task panicked or was cancelled.
    #[error("password task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

impl AuthError {
    /// Whether the caller, not the server, is at fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::MissingToken | Self::InvalidToken(_)
        )
    }
}
