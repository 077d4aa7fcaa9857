//! Service-level error taxonomy.

use thiserror::Error;

use store_ratings_core::{AccessDenied, EmailError, ValidationError};

use super::auth::AuthError;
use crate::db::RepositoryError;

/// Errors returned by every service operation.
///
/// Routes translate these into HTTP statuses; see [`crate::error::AppError`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input broke a field rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Caller could not be authenticated.
    #[error(transparent)]
    Unauthenticated(AuthError),

    /// Caller is authenticated but not allowed.
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    /// Email already used by an account or store.
    #[error("email already exists")]
    DuplicateEmail,

    /// A referenced user or store does not exist.
    #[error("{0}")]
    MissingReference(String),

    /// The addressed record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Storage failure.
    #[error("repository error: {0}")]
    Repository(RepositoryError),

    /// Hashing or token signing failure.
    #[error("auth error: {0}")]
    Auth(AuthError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => Self::DuplicateEmail,
            RepositoryError::MissingReference(what) => Self::MissingReference(what),
            RepositoryError::NotFound => Self::NotFound("record"),
            other => Self::Repository(other),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        if err.is_client_error() {
            Self::Unauthenticated(err)
        } else {
            Self::Auth(err)
        }
    }
}

impl From<EmailError> for ServiceError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.into())
    }
}
